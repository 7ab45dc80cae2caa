// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use serde::{Deserialize, Serialize};

use crate::measurement::field::Field;
use crate::measurement::measurement::Measurement;
use crate::query::range_query::scan_non_empty;
use crate::query::time_range::TimeRange;
use crate::stats::accumulator::Accumulator;
use crate::store::MeasurementStore;
use crate::utils::error::MeasureDBError;

/// Placeholder for an omitted date when echoing the requested date range.
const NOT_APPLICABLE: &str = "N/A";

/// Statistics of a field over a set of measurements, at full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
  field: Field,
  count: u64,
  avg: f64,
  min: f64,
  max: f64,
  std_dev: f64,
  range: f64,
}

impl Metrics {
  /// Compute metrics from the values gathered by an accumulator. An empty accumulator is an error.
  pub fn from_accumulator(field: Field, accumulator: &Accumulator) -> Result<Self, MeasureDBError> {
    let (avg, min, max, std_dev) = match (
      accumulator.mean(),
      accumulator.min(),
      accumulator.max(),
      accumulator.population_std_dev(),
    ) {
      (Some(avg), Some(min), Some(max), Some(std_dev)) => (avg, min, max, std_dev),
      _ => return Err(MeasureDBError::EmptyResult),
    };

    let range = max - min;
    for (name, value) in [("avg", avg), ("stdDev", std_dev), ("range", range)] {
      if !value.is_finite() {
        return Err(MeasureDBError::InvalidStatistic(name.to_owned()));
      }
    }

    Ok(Metrics {
      field,
      count: accumulator.get_count(),
      avg,
      min,
      max,
      std_dev,
      range,
    })
  }

  /// Compute metrics of the given field over the measurements.
  pub fn compute(field: Field, measurements: &[Measurement]) -> Result<Self, MeasureDBError> {
    let accumulator: Accumulator = measurements.iter().map(|m| m.get_value(field)).collect();
    Metrics::from_accumulator(field, &accumulator)
  }

  pub fn get_field(&self) -> Field {
    self.field
  }

  pub fn get_count(&self) -> u64 {
    self.count
  }

  pub fn get_avg(&self) -> f64 {
    self.avg
  }

  pub fn get_min(&self) -> f64 {
    self.min
  }

  pub fn get_max(&self) -> f64 {
    self.max
  }

  /// Population standard deviation.
  pub fn get_std_dev(&self) -> f64 {
    self.std_dev
  }

  /// Difference between max and min.
  pub fn get_range(&self) -> f64 {
    self.range
  }

  /// Round for presentation, optionally echoing the requested date range.
  pub fn to_result(&self, date_range: Option<DateRangeEcho>) -> MetricsResult {
    MetricsResult {
      field: self.field,
      count: self.count,
      avg: round_to_two_decimals(self.avg),
      min: round_to_two_decimals(self.min),
      max: round_to_two_decimals(self.max),
      std_dev: round_to_two_decimals(self.std_dev),
      range: round_to_two_decimals(self.range),
      date_range,
    }
  }
}

/// The date bounds a metrics request was made with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateRangeEcho {
  start: String,
  end: String,
}

impl DateRangeEcho {
  /// Echo the given dates. Returns `None` when neither date was given.
  pub fn from_dates(start_date: Option<&str>, end_date: Option<&str>) -> Option<Self> {
    let start_date = start_date.filter(|s| !s.is_empty());
    let end_date = end_date.filter(|s| !s.is_empty());
    if start_date.is_none() && end_date.is_none() {
      return None;
    }

    Some(DateRangeEcho {
      start: start_date.unwrap_or(NOT_APPLICABLE).to_owned(),
      end: end_date.unwrap_or(NOT_APPLICABLE).to_owned(),
    })
  }
}

/// Metrics as presented to clients, with every float rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
  field: Field,
  count: u64,
  avg: f64,
  min: f64,
  max: f64,
  std_dev: f64,
  range: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  date_range: Option<DateRangeEcho>,
}

impl MetricsResult {
  pub fn get_count(&self) -> u64 {
    self.count
  }

  pub fn get_avg(&self) -> f64 {
    self.avg
  }

  pub fn get_std_dev(&self) -> f64 {
    self.std_dev
  }

  pub fn get_range(&self) -> f64 {
    self.range
  }
}

/// Round half away from zero to two decimal places.
///
/// Values too large to scale by 100 have no fractional digits left, and are returned as they are.
pub fn round_to_two_decimals(value: f64) -> f64 {
  let scaled = value * 100.0;
  if !scaled.is_finite() {
    return value;
  }
  scaled.round() / 100.0
}

/// Compute metrics of a field over the measurements within the range.
pub fn query_metrics(
  store: &dyn MeasurementStore,
  field: Field,
  range: &TimeRange,
) -> Result<Metrics, MeasureDBError> {
  let measurements = scan_non_empty(store, range)?;
  Metrics::compute(field, &measurements)
}
