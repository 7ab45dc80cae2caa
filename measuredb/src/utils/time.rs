// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::utils::error::MeasureDBError;

/// Format of calendar dates accepted in queries and returned by date range discovery.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a timestamp as an ISO-8601 instant with millisecond precision, e.g. `2024-01-05T13:00:00.000Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
  timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format the UTC calendar date of a timestamp, e.g. `2024-01-05`.
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
  timestamp.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` calendar date. `parameter` names the query parameter the value came from.
pub fn parse_date(parameter: &str, value: &str) -> Result<NaiveDate, MeasureDBError> {
  let invalid = || MeasureDBError::InvalidDateFormat {
    parameter: parameter.to_owned(),
    value: value.to_owned(),
  };

  // chrono accepts unpadded months and days, and signed years. Only the strict form is allowed here.
  let bytes = value.as_bytes();
  let is_strict = bytes.len() == 10
    && bytes[4] == b'-'
    && bytes[7] == b'-'
    && bytes
      .iter()
      .enumerate()
      .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
  if !is_strict {
    return Err(invalid());
  }

  NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

/// The first millisecond of the given day, in UTC.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The last millisecond of the given day, in UTC.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
  start_of_day(date) + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
}

/// Parses a timeout such as `500ms`, `2s` or `1m`.
pub fn parse_timeout(s: &str) -> Result<Duration, MeasureDBError> {
  let invalid = || MeasureDBError::InvalidTimeout(s.to_owned());

  let (value, unit_millis) = if let Some(value) = s.strip_suffix("ms") {
    (value, 1)
  } else if let Some(value) = s.strip_suffix('s') {
    (value, 1000)
  } else if let Some(value) = s.strip_suffix('m') {
    (value, 60 * 1000)
  } else {
    return Err(invalid());
  };

  let value = value.parse::<u64>().map_err(|_| invalid())?;
  if value == 0 {
    return Err(invalid());
  }

  value
    .checked_mul(unit_millis)
    .map(Duration::from_millis)
    .ok_or_else(invalid)
}

/// Whole milliseconds in the duration, saturating at `u64::MAX`.
pub fn duration_to_millis(duration: Duration) -> u64 {
  u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::TimeZone;
  use test_case::test_case;

  #[test]
  fn test_format_timestamp() {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 5, 13, 0, 0).unwrap();
    assert_eq!(format_timestamp(&timestamp), "2024-01-05T13:00:00.000Z");
    assert_eq!(format_date(&timestamp), "2024-01-05");
  }

  #[test]
  fn test_day_bounds() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(
      format_timestamp(&start_of_day(date)),
      "2024-02-29T00:00:00.000Z"
    );
    assert_eq!(format_timestamp(&end_of_day(date)), "2024-02-29T23:59:59.999Z");
  }

  #[test_case("2024-01-05" ; "plain date")]
  #[test_case("1999-12-31" ; "last day of year")]
  fn test_parse_valid_date(value: &str) {
    assert!(parse_date("start_date", value).is_ok());
  }

  #[test_case("" ; "empty")]
  #[test_case("2024-1-5" ; "unpadded")]
  #[test_case("2024/01/05" ; "wrong separator")]
  #[test_case("2024-02-30" ; "no such day")]
  #[test_case("2024-01-05T00:00:00Z" ; "instant instead of date")]
  #[test_case("yesterday" ; "words")]
  fn test_parse_invalid_date(value: &str) {
    assert_eq!(
      parse_date("end_date", value),
      Err(MeasureDBError::InvalidDateFormat {
        parameter: "end_date".to_owned(),
        value: value.to_owned(),
      })
    );
  }

  #[test_case("250ms", 250 ; "milliseconds")]
  #[test_case("2s", 2000 ; "seconds")]
  #[test_case("1m", 60000 ; "minutes")]
  fn test_parse_timeout(s: &str, expected_millis: u64) {
    assert_eq!(
      parse_timeout(s).unwrap(),
      Duration::from_millis(expected_millis)
    );
  }

  #[test_case("" ; "empty")]
  #[test_case("0s" ; "zero")]
  #[test_case("10" ; "no unit")]
  #[test_case("1h" ; "unsupported unit")]
  #[test_case("-1s" ; "negative")]
  fn test_parse_invalid_timeout(s: &str) {
    assert_eq!(
      parse_timeout(s),
      Err(MeasureDBError::InvalidTimeout(s.to_owned()))
    );
  }

  #[test_case(Duration::from_millis(1500), 1500 ; "millis")]
  #[test_case(Duration::from_micros(2999), 2 ; "truncates sub millisecond part")]
  #[test_case(Duration::MAX, u64::MAX ; "saturates")]
  fn test_duration_to_millis(duration: Duration, expected: u64) {
    assert_eq!(duration_to_millis(duration), expected);
  }
}
