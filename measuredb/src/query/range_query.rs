// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use chrono::{DateTime, Utc};
use log::debug;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::measurement::field::Field;
use crate::measurement::measurement::Measurement;
use crate::query::time_range::TimeRange;
use crate::store::{MeasurementStore, ScanResult};
use crate::utils::error::MeasureDBError;
use crate::utils::time::format_timestamp;

/// A measurement projected on a single field. Serializes as `{"timestamp": ..., "<field>": value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
  timestamp: DateTime<Utc>,
  field: Field,
  value: f64,
}

impl FieldRow {
  pub fn get_timestamp(&self) -> DateTime<Utc> {
    self.timestamp
  }

  pub fn get_field(&self) -> Field {
    self.field
  }

  pub fn get_value(&self) -> f64 {
    self.value
  }
}

impl Serialize for FieldRow {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("timestamp", &format_timestamp(&self.timestamp))?;
    map.serialize_entry(self.field.as_str(), &self.value)?;
    map.end()
  }
}

/// A measurement with all of its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllFieldsRow {
  #[serde(serialize_with = "serialize_timestamp")]
  timestamp: DateTime<Utc>,
  field1: f64,
  field2: f64,
  field3: f64,
}

impl AllFieldsRow {
  pub fn get_timestamp(&self) -> DateTime<Utc> {
    self.timestamp
  }

  pub fn get_value(&self, field: Field) -> f64 {
    match field {
      Field::Field1 => self.field1,
      Field::Field2 => self.field2,
      Field::Field3 => self.field3,
    }
  }
}

fn serialize_timestamp<S: Serializer>(
  timestamp: &DateTime<Utc>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&format_timestamp(timestamp))
}

/// Project measurements on a single field, keeping their order.
pub fn project_field(measurements: &[Measurement], field: Field) -> Vec<FieldRow> {
  measurements
    .iter()
    .map(|m| FieldRow {
      timestamp: m.get_timestamp(),
      field,
      value: m.get_value(field),
    })
    .collect()
}

/// Project measurements on all fields, keeping their order.
pub fn project_all_fields(measurements: &[Measurement]) -> Vec<AllFieldsRow> {
  measurements
    .iter()
    .map(|m| AllFieldsRow {
      timestamp: m.get_timestamp(),
      field1: m.get_value(Field::Field1),
      field2: m.get_value(Field::Field2),
      field3: m.get_value(Field::Field3),
    })
    .collect()
}

/// Read the measurements within the range, in ascending time order. No matching measurement is an error.
pub fn scan_non_empty(
  store: &dyn MeasurementStore,
  range: &TimeRange,
) -> Result<ScanResult, MeasureDBError> {
  let measurements = store.scan(range)?;
  debug!(
    "Range query {:?} matched {} measurements",
    range,
    measurements.len()
  );

  if measurements.is_empty() {
    return Err(MeasureDBError::EmptyResult);
  }
  Ok(measurements)
}

/// Get the time series of a single field within the range.
pub fn query_field(
  store: &dyn MeasurementStore,
  field: Field,
  range: &TimeRange,
) -> Result<Vec<FieldRow>, MeasureDBError> {
  let measurements = scan_non_empty(store, range)?;
  Ok(project_field(&measurements, field))
}

/// Get all fields of the measurements within the range.
pub fn query_all_fields(
  store: &dyn MeasurementStore,
  range: &TimeRange,
) -> Result<Vec<AllFieldsRow>, MeasureDBError> {
  let measurements = scan_non_empty(store, range)?;
  Ok(project_all_fields(&measurements))
}
