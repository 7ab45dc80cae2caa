// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use chrono::{DateTime, Utc};

use crate::utils::error::MeasureDBError;
use crate::utils::time::{end_of_day, parse_date, start_of_day};

/// An inclusive range of timestamps. A missing bound leaves that side of the range open.
///
/// Inverted ranges (start after end) are allowed and simply match nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
  start: Option<DateTime<Utc>>,
  end: Option<DateTime<Utc>>,
}

impl TimeRange {
  /// Create a new TimeRange from given (inclusive) bounds.
  pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
    TimeRange { start, end }
  }

  /// A range that matches every timestamp.
  pub fn unbounded() -> Self {
    TimeRange::default()
  }

  /// Build a range from optional `YYYY-MM-DD` start and end dates. The start date is bound at the first
  /// millisecond of its day, and the end date at the last millisecond of its day. Empty strings are
  /// treated the same as absent dates.
  pub fn from_dates(
    start_date: Option<&str>,
    end_date: Option<&str>,
  ) -> Result<Self, MeasureDBError> {
    let start = match start_date.filter(|s| !s.is_empty()) {
      Some(s) => Some(start_of_day(parse_date("start_date", s)?)),
      None => None,
    };
    let end = match end_date.filter(|s| !s.is_empty()) {
      Some(s) => Some(end_of_day(parse_date("end_date", s)?)),
      None => None,
    };
    Ok(TimeRange { start, end })
  }

  /// Get the start bound.
  pub fn get_start(&self) -> Option<DateTime<Utc>> {
    self.start
  }

  /// Get the end bound.
  pub fn get_end(&self) -> Option<DateTime<Utc>> {
    self.end
  }

  /// Check whether the given timestamp falls within this range.
  pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
    self.start.map_or(true, |start| *timestamp >= start)
      && self.end.map_or(true, |end| *timestamp <= end)
  }
}
