// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Replace the contents of the configured measurement store with generated sample data.
//!
//! Uses the same configuration as the measurement server: the config directory is read from
//! `MEASURE_CONFIG_DIR_PATH`, defaulting to `config`.

use std::env;

use chrono::Utc;
use log::{error, info};
use tracing_subscriber::EnvFilter;

use measuredb::measurement::field::Field;
use measuredb::query::time_range::TimeRange;
use measuredb::seed::{generate_sample_data, reseed_store, DEFAULT_NUM_DAYS, DEFAULT_RECORDS_PER_DAY};
use measuredb::utils::environment::load_env;
use measuredb::utils::error::MeasureDBError;
use measuredb::MeasureDB;

async fn run_seed() -> Result<(), MeasureDBError> {
  let config_dir_path = &env::var("MEASURE_CONFIG_DIR_PATH").unwrap_or_else(|_| "config".to_owned());
  let measuredb = MeasureDB::new(config_dir_path)?;

  let measurements = generate_sample_data(
    Utc::now(),
    DEFAULT_NUM_DAYS,
    DEFAULT_RECORDS_PER_DAY,
    &mut rand::thread_rng(),
  );
  let summary = reseed_store(measuredb.get_store().as_ref(), measurements)?;
  info!(
    "Replaced {} measurements with {} sample measurements",
    summary.num_deleted, summary.num_inserted
  );

  let date_range = measuredb.get_date_range().await?;
  info!(
    "Sample data covers {} to {}",
    date_range.get_min_date(),
    date_range.get_max_date()
  );

  for field in Field::ALL {
    let metrics = measuredb.get_metrics(field, TimeRange::unbounded()).await?;
    info!("Average {}: {:.2}", field, metrics.get_avg());
  }

  Ok(())
}

fn main() {
  // Load environment variables from ".env" and ".env-creds" file.
  load_env();

  // If log level isn't set, set it to info.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info")
  }

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let runtime = match tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
  {
    Ok(runtime) => runtime,
    Err(err) => {
      error!("Could not start the async runtime: {}", err);
      std::process::exit(1);
    }
  };

  if let Err(err) = runtime.block_on(run_seed()) {
    error!("Seeding failed: {}", err);
    std::process::exit(1);
  }
}
