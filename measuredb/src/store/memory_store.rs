// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::ops::Range;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::measurement::measurement::Measurement;
use crate::query::time_range::TimeRange;
use crate::store::{MeasurementStore, ScanResult};
use crate::utils::error::MeasureDBError;

/// Measurements held in memory, sorted by timestamp.
///
/// The sorted vector is shared behind an `Arc`: readers clone the `Arc` and work on that snapshot
/// without holding the lock, while writers build a new vector and swap it in.
#[derive(Debug, Default)]
pub struct MemoryStore {
  snapshot: RwLock<Arc<Vec<Measurement>>>,
}

impl MemoryStore {
  /// Create a new empty store.
  pub fn new() -> Self {
    MemoryStore::default()
  }

  /// Create a new store holding the given measurements, in any order.
  pub fn new_with_measurements(measurements: Vec<Measurement>) -> Result<Self, MeasureDBError> {
    let merged = merge_sorted(&[], measurements)?;
    Ok(MemoryStore {
      snapshot: RwLock::new(Arc::new(merged)),
    })
  }

  /// Get the current snapshot.
  pub(crate) fn snapshot(&self) -> Arc<Vec<Measurement>> {
    self.snapshot.read().clone()
  }

  /// Replace the contents of this store with the given sorted measurements.
  pub(crate) fn replace(&self, sorted: Vec<Measurement>) {
    *self.snapshot.write() = Arc::new(sorted);
  }
}

/// Merge new measurements into already sorted ones. Every new measurement is validated first, so that
/// nothing is merged if any of them is invalid.
pub(crate) fn merge_sorted(
  sorted: &[Measurement],
  measurements: Vec<Measurement>,
) -> Result<Vec<Measurement>, MeasureDBError> {
  for measurement in &measurements {
    measurement.validate()?;
  }

  let mut merged = Vec::with_capacity(sorted.len() + measurements.len());
  merged.extend_from_slice(sorted);
  merged.extend(measurements);

  // Stable, so measurements sharing a timestamp keep their insertion order.
  merged.sort_by_key(|m| m.get_timestamp());
  Ok(merged)
}

/// Get the positions of the sorted measurements that fall within the range.
pub(crate) fn window_in_range(sorted: &[Measurement], range: &TimeRange) -> Range<usize> {
  let lower = match range.get_start() {
    Some(start) => sorted.partition_point(|m| m.get_timestamp() < start),
    None => 0,
  };
  let upper = match range.get_end() {
    Some(end) => sorted.partition_point(|m| m.get_timestamp() <= end),
    None => sorted.len(),
  };

  // Inverted ranges match nothing.
  lower..upper.max(lower)
}

impl MeasurementStore for MemoryStore {
  fn scan(&self, range: &TimeRange) -> Result<ScanResult, MeasureDBError> {
    let snapshot = self.snapshot();
    let window = window_in_range(&snapshot, range);
    Ok(ScanResult::new(snapshot, window))
  }

  fn first(&self) -> Result<Option<Measurement>, MeasureDBError> {
    Ok(self.snapshot().first().cloned())
  }

  fn last(&self) -> Result<Option<Measurement>, MeasureDBError> {
    Ok(self.snapshot().last().cloned())
  }

  fn count(&self) -> Result<usize, MeasureDBError> {
    Ok(self.snapshot().len())
  }

  fn insert_many(&self, measurements: Vec<Measurement>) -> Result<usize, MeasureDBError> {
    let num_measurements = measurements.len();

    // Hold the write lock while merging, so that concurrent inserts don't lose each other's data.
    let mut snapshot = self.snapshot.write();
    let merged = merge_sorted(&snapshot, measurements)?;
    *snapshot = Arc::new(merged);

    debug!("Inserted {} measurements in memory store", num_measurements);
    Ok(num_measurements)
  }

  fn clear(&self) -> Result<usize, MeasureDBError> {
    let mut snapshot = self.snapshot.write();
    let num_deleted = snapshot.len();
    *snapshot = Arc::new(Vec::new());
    Ok(num_deleted)
  }
}
