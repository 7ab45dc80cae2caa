// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use approx::abs_diff_eq;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::measurement::field::Field;
use crate::utils::error::MeasureDBError;

/// A single timestamped reading with three numeric fields. Measurements are never modified once written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Measurement {
  /// Time of the reading, stored as milliseconds from epoch.
  #[serde(with = "ts_milliseconds")]
  timestamp: DateTime<Utc>,

  field1: f64,
  field2: f64,
  field3: f64,
}

impl Measurement {
  /// Create a new Measurement from given timestamp and field values.
  pub fn new(timestamp: DateTime<Utc>, field1: f64, field2: f64, field3: f64) -> Self {
    Measurement {
      timestamp,
      field1,
      field2,
      field3,
    }
  }

  /// Create a new Measurement from a timestamp given as milliseconds from epoch.
  pub fn new_from_millis(
    time: i64,
    field1: f64,
    field2: f64,
    field3: f64,
  ) -> Result<Self, MeasureDBError> {
    let timestamp = Utc.timestamp_millis_opt(time).single().ok_or_else(|| {
      MeasureDBError::InvalidMeasurement(format!("Timestamp {} is out of range", time))
    })?;
    Ok(Measurement::new(timestamp, field1, field2, field3))
  }

  /// Get timestamp.
  pub fn get_timestamp(&self) -> DateTime<Utc> {
    self.timestamp
  }

  /// Get the value of the given field.
  pub fn get_value(&self, field: Field) -> f64 {
    match field {
      Field::Field1 => self.field1,
      Field::Field2 => self.field2,
      Field::Field3 => self.field3,
    }
  }

  /// Check that every field holds a finite number.
  pub fn validate(&self) -> Result<(), MeasureDBError> {
    for field in Field::ALL {
      let value = self.get_value(field);
      if !value.is_finite() {
        return Err(MeasureDBError::InvalidMeasurement(format!(
          "{} at {} is not a finite number: {}",
          field, self.timestamp, value
        )));
      }
    }
    Ok(())
  }
}

impl PartialEq for Measurement {
  fn eq(&self, other: &Measurement) -> bool {
    self.timestamp == other.timestamp
      && Field::ALL
        .into_iter()
        .all(|field| abs_diff_eq!(self.get_value(field), other.get_value(field)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_measurement() {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 5, 13, 0, 0).unwrap();
    let measurement = Measurement::new(timestamp, 21.5, 60.25, 512.0);

    assert_eq!(measurement.get_timestamp(), timestamp);
    assert_eq!(measurement.get_value(Field::Field1), 21.5);
    assert_eq!(measurement.get_value(Field::Field2), 60.25);
    assert_eq!(measurement.get_value(Field::Field3), 512.0);
    assert!(measurement.validate().is_ok());

    let from_millis =
      Measurement::new_from_millis(timestamp.timestamp_millis(), 21.5, 60.25, 512.0).unwrap();
    assert_eq!(measurement, from_millis);
  }

  #[test]
  fn test_non_finite_values_are_invalid() {
    let measurement = Measurement::new_from_millis(0, 1.0, f64::NAN, 3.0).unwrap();
    assert_eq!(measurement.validate().unwrap_err().kind(), "invalid_measurement");

    let measurement = Measurement::new_from_millis(0, 1.0, 2.0, f64::INFINITY).unwrap();
    assert!(measurement.validate().is_err());
  }

  #[test]
  fn test_serialized_timestamp_is_millis() {
    let measurement = Measurement::new_from_millis(1_704_459_600_123, 1.0, 2.0, 3.0).unwrap();
    let json = serde_json::to_value(&measurement).unwrap();
    assert_eq!(json["timestamp"], 1_704_459_600_123_i64);

    let decoded: Measurement = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, measurement);
  }

  #[test]
  fn test_missing_field_is_rejected() {
    let result: Result<Measurement, _> =
      serde_json::from_str(r#"{"timestamp": 0, "field1": 1.0, "field2": 2.0}"#);
    assert!(result.is_err());
  }
}
