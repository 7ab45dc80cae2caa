// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Storage for measurements.
//!
//! A store is an explicitly constructed handle that is passed to whoever needs it. Every read sees a
//! consistent point-in-time snapshot of the store: a bulk insert running concurrently is either fully
//! visible to a query, or not visible at all.

pub mod file_store;
pub mod memory_store;

use std::ops::{Deref, Range};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::measurement::measurement::Measurement;
use crate::query::time_range::TimeRange;
use crate::utils::config::{MeasureDBSettings, StorageType};
use crate::utils::error::MeasureDBError;

use self::file_store::FileStore;
use self::memory_store::MemoryStore;

/// Measurements matched by a scan, sorted by ascending timestamp.
///
/// This is a window onto a shared snapshot, so scanning does not copy the matched measurements.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
  snapshot: Arc<Vec<Measurement>>,
  window: Range<usize>,
}

impl ScanResult {
  /// Create a window onto the given sorted snapshot. The window is clamped to the snapshot.
  pub fn new(snapshot: Arc<Vec<Measurement>>, window: Range<usize>) -> Self {
    let end = window.end.min(snapshot.len());
    let start = window.start.min(end);
    ScanResult {
      snapshot,
      window: start..end,
    }
  }

  pub fn as_slice(&self) -> &[Measurement] {
    &self.snapshot[self.window.clone()]
  }
}

impl Deref for ScanResult {
  type Target = [Measurement];

  fn deref(&self) -> &[Measurement] {
    self.as_slice()
  }
}

impl From<Vec<Measurement>> for ScanResult {
  fn from(measurements: Vec<Measurement>) -> Self {
    let len = measurements.len();
    ScanResult::new(Arc::new(measurements), 0..len)
  }
}

#[cfg_attr(test, mockall::automock)]
pub trait MeasurementStore: Send + Sync {
  /// Get the measurements within the given (inclusive) range, sorted by ascending timestamp.
  fn scan(&self, range: &TimeRange) -> Result<ScanResult, MeasureDBError>;

  /// Get the earliest measurement, if any.
  fn first(&self) -> Result<Option<Measurement>, MeasureDBError>;

  /// Get the latest measurement, if any.
  fn last(&self) -> Result<Option<Measurement>, MeasureDBError>;

  /// Get the number of stored measurements.
  fn count(&self) -> Result<usize, MeasureDBError>;

  /// Add the given measurements in bulk. Either all of them are added, or none. Returns the number added.
  fn insert_many(&self, measurements: Vec<Measurement>) -> Result<usize, MeasureDBError>;

  /// Remove every measurement. Returns the number removed.
  fn clear(&self) -> Result<usize, MeasureDBError>;
}

/// Open the store described by the given settings.
pub fn open_store(
  settings: &MeasureDBSettings,
) -> Result<Arc<dyn MeasurementStore>, MeasureDBError> {
  match settings.get_storage_type() {
    StorageType::Memory => {
      info!("Using in-memory measurement store");
      Ok(Arc::new(MemoryStore::new()))
    }
    StorageType::File => {
      let file_path = Path::new(settings.get_data_file_path());
      info!("Using measurement store at {}", file_path.display());
      Ok(Arc::new(FileStore::open(file_path)?))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::{TimeZone, Utc};

  fn measurements(num: u32) -> Vec<Measurement> {
    (0..num)
      .map(|i| {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 5, i, 0, 0).unwrap();
        Measurement::new(timestamp, i as f64, 0.0, 0.0)
      })
      .collect()
  }

  #[test]
  fn test_scan_result_window() {
    let snapshot = Arc::new(measurements(6));
    let result = ScanResult::new(snapshot.clone(), 2..4);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0], snapshot[2]);

    // Windows past the end of the snapshot are clamped.
    assert_eq!(ScanResult::new(snapshot.clone(), 4..10).len(), 2);
    assert!(ScanResult::new(snapshot, 8..10).is_empty());

    let result: ScanResult = measurements(3).into();
    assert_eq!(result.as_slice(), measurements(3).as_slice());
    assert!(ScanResult::default().is_empty());
  }
}
