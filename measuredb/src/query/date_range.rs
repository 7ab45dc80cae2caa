// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use serde::{Deserialize, Serialize};

use crate::store::MeasurementStore;
use crate::utils::error::MeasureDBError;
use crate::utils::time::format_date;

/// The calendar dates of the earliest and latest stored measurements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
  min_date: String,
  max_date: String,
}

impl DateRange {
  pub fn get_min_date(&self) -> &str {
    &self.min_date
  }

  pub fn get_max_date(&self) -> &str {
    &self.max_date
  }
}

/// Find the range of dates covered by the store. An empty store is an error rather than an empty range.
pub fn discover_date_range(store: &dyn MeasurementStore) -> Result<DateRange, MeasureDBError> {
  match (store.first()?, store.last()?) {
    (Some(first), Some(last)) => Ok(DateRange {
      min_date: format_date(&first.get_timestamp()),
      max_date: format_date(&last.get_timestamp()),
    }),
    _ => Err(MeasureDBError::EmptyStore),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::{TimeZone, Utc};
  use serde_json::json;

  use crate::measurement::measurement::Measurement;
  use crate::store::memory_store::MemoryStore;

  #[test]
  fn test_empty_store() {
    let store = MemoryStore::new();
    assert_eq!(discover_date_range(&store), Err(MeasureDBError::EmptyStore));
  }

  #[test]
  fn test_date_range() {
    let measurements = vec![
      Measurement::new(Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap(), 1.0, 1.0, 1.0),
      Measurement::new(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap(), 1.0, 1.0, 1.0),
      Measurement::new(Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap(), 1.0, 1.0, 1.0),
    ];
    let store = MemoryStore::new_with_measurements(measurements).unwrap();

    let date_range = discover_date_range(&store).unwrap();
    assert_eq!(date_range.get_min_date(), "2023-12-31");
    assert_eq!(date_range.get_max_date(), "2024-01-07");
    assert_eq!(
      serde_json::to_value(&date_range).unwrap(),
      json!({"minDate": "2023-12-31", "maxDate": "2024-01-07"})
    );
  }

  #[test]
  fn test_single_measurement() {
    let measurement =
      Measurement::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(), 1.0, 2.0, 3.0);
    let store = MemoryStore::new_with_measurements(vec![measurement]).unwrap();

    let date_range = discover_date_range(&store).unwrap();
    assert_eq!(date_range.get_min_date(), date_range.get_max_date());
  }
}
