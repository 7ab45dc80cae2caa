// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Generation of sample measurements, for demos and local development.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use log::info;
use rand::Rng;

use crate::measurement::measurement::Measurement;
use crate::stats::metrics::round_to_two_decimals;
use crate::store::MeasurementStore;
use crate::utils::error::MeasureDBError;

pub const DEFAULT_NUM_DAYS: u32 = 30;
pub const DEFAULT_RECORDS_PER_DAY: u32 = 24;

/// Outcome of reseeding a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
  pub num_deleted: usize,
  pub num_inserted: usize,
}

/// Generate hourly sample measurements for today and each of the `num_days` days before it, oldest first.
///
/// - field1 looks like a temperature in °C, following a daily cycle around 22.
/// - field2 looks like a relative humidity in %, moving opposite to the temperature around 60.
/// - field3 looks like a CO2 level in ppm, with two cycles a day around 500.
pub fn generate_sample_data<R: Rng>(
  now: DateTime<Utc>,
  num_days: u32,
  records_per_day: u32,
  rng: &mut R,
) -> Vec<Measurement> {
  let today = now.date_naive();
  let mut measurements = Vec::with_capacity(((num_days + 1) * records_per_day) as usize);

  for day in (0..=num_days).rev() {
    let day_start = (today - Duration::days(day as i64))
      .and_time(chrono::NaiveTime::MIN)
      .and_utc();

    for hour in 0..records_per_day {
      let timestamp = day_start + Duration::hours(hour as i64);
      let daily_phase = (hour as f64 / 24.0) * PI * 2.0;

      let field1 = 22.0 + daily_phase.sin() * 4.0 + noise(rng, 2.0);
      let field2 = 60.0 - daily_phase.sin() * 10.0 + noise(rng, 5.0);
      let field3 = 500.0 + (hour as f64 / 12.0 * PI).sin() * 100.0 + noise(rng, 50.0);

      measurements.push(Measurement::new(
        timestamp,
        round_to_two_decimals(field1),
        round_to_two_decimals(field2),
        round_to_two_decimals(field3),
      ));
    }
  }

  measurements
}

/// Uniform noise in `[-width / 2, width / 2)`.
fn noise<R: Rng>(rng: &mut R, width: f64) -> f64 {
  (rng.gen::<f64>() - 0.5) * width
}

/// Replace everything in the store with the given measurements.
pub fn reseed_store(
  store: &dyn MeasurementStore,
  measurements: Vec<Measurement>,
) -> Result<SeedSummary, MeasureDBError> {
  let num_deleted = store.clear()?;
  info!("Cleared {} existing measurements", num_deleted);

  let num_inserted = store.insert_many(measurements)?;
  info!("Inserted {} measurements", num_inserted);

  Ok(SeedSummary {
    num_deleted,
    num_inserted,
  })
}
