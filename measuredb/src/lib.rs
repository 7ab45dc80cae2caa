// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! MeasureDB stores timestamped measurements and answers range queries and statistics over them.
//!
//! Every measurement carries three numeric fields. Queries select measurements by an inclusive date range
//! and either project them (on one field or on all of them) or aggregate one field into [`Metrics`].
//! None of the operations keep state between calls: each is a read of the store's current snapshot.

pub mod measurement;
pub mod query;
pub mod seed;
pub mod stats;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::measurement::field::Field;
use crate::query::date_range::{discover_date_range, DateRange};
use crate::query::range_query::{query_all_fields, query_field, AllFieldsRow, FieldRow};
use crate::query::time_range::TimeRange;
use crate::stats::metrics::{query_metrics, Metrics};
use crate::store::{open_store, MeasurementStore};
use crate::utils::config::Settings;
use crate::utils::error::MeasureDBError;
use crate::utils::time::duration_to_millis;

/// Query interface over a measurement store.
///
/// Cloning is cheap, and clones share the same store.
#[derive(Clone)]
pub struct MeasureDB {
  store: Arc<dyn MeasurementStore>,
  query_timeout: Duration,
}

impl MeasureDB {
  /// Create a new MeasureDB with the store described by the config in the given directory.
  pub fn new(config_dir_path: &str) -> Result<Self, MeasureDBError> {
    let settings = Settings::new(config_dir_path)?;
    let measuredb_settings = settings.get_measuredb_settings();
    let store = open_store(measuredb_settings)?;

    info!(
      "Opened measurement store with {} measurements",
      store.count()?
    );

    Ok(MeasureDB::with_store(
      store,
      measuredb_settings.get_query_timeout(),
    ))
  }

  /// Create a new MeasureDB over the given store.
  pub fn with_store(store: Arc<dyn MeasurementStore>, query_timeout: Duration) -> Self {
    MeasureDB {
      store,
      query_timeout,
    }
  }

  /// Get a MeasureDB sharing this store, whose queries use the given timeout.
  pub fn with_timeout(&self, query_timeout: Duration) -> Self {
    MeasureDB {
      store: self.store.clone(),
      query_timeout,
    }
  }

  /// Get the underlying store.
  pub fn get_store(&self) -> &Arc<dyn MeasurementStore> {
    &self.store
  }

  /// Get the time after which queries fail with a timeout.
  pub fn get_query_timeout(&self) -> Duration {
    self.query_timeout
  }

  /// Run the given read against the store on the blocking thread pool, bounded by the query timeout.
  async fn run_query<T, F>(&self, query: F) -> Result<T, MeasureDBError>
  where
    T: Send + 'static,
    F: FnOnce(&dyn MeasurementStore) -> Result<T, MeasureDBError> + Send + 'static,
  {
    let store = self.store.clone();
    let handle = tokio::task::spawn_blocking(move || query(store.as_ref()));

    match tokio::time::timeout(self.query_timeout, handle).await {
      Ok(Ok(result)) => result,
      Ok(Err(join_error)) => Err(MeasureDBError::Internal(join_error.to_string())),
      Err(_) => Err(MeasureDBError::Timeout(duration_to_millis(
        self.query_timeout,
      ))),
    }
  }

  /// Get the time series of a field within the range, in ascending time order.
  pub async fn get_measurements(
    &self,
    field: Field,
    range: TimeRange,
  ) -> Result<Vec<FieldRow>, MeasureDBError> {
    debug!("Getting measurements of {} in {:?}", field, range);
    self
      .run_query(move |store| query_field(store, field, &range))
      .await
  }

  /// Get all fields of the measurements within the range, in ascending time order.
  pub async fn get_all_fields(&self, range: TimeRange) -> Result<Vec<AllFieldsRow>, MeasureDBError> {
    debug!("Getting all fields in {:?}", range);
    self
      .run_query(move |store| query_all_fields(store, &range))
      .await
  }

  /// Get statistics of a field over the measurements within the range.
  pub async fn get_metrics(&self, field: Field, range: TimeRange) -> Result<Metrics, MeasureDBError> {
    debug!("Getting metrics of {} in {:?}", field, range);
    self
      .run_query(move |store| query_metrics(store, field, &range))
      .await
  }

  /// Get the dates of the earliest and latest measurements.
  pub async fn get_date_range(&self) -> Result<DateRange, MeasureDBError> {
    self.run_query(discover_date_range).await
  }

  /// Get the number of stored measurements.
  pub async fn count(&self) -> Result<usize, MeasureDBError> {
    self.run_query(|store| store.count()).await
  }
}
