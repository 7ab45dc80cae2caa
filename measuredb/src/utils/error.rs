// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
/// Enum for various errors in measuredb.
pub enum MeasureDBError {
  #[error("Field parameter is required.")]
  MissingField,

  #[error("Invalid field name {0}. Must be field1, field2, or field3.")]
  InvalidField(String),

  #[error("Invalid {parameter} format {value:?}. Use YYYY-MM-DD.")]
  InvalidDateFormat { parameter: String, value: String },

  #[error("Invalid timeout {0}. Use a positive number followed by ms, s or m.")]
  InvalidTimeout(String),

  #[error("Invalid query string. {0}")]
  InvalidQueryString(String),

  #[error("No data found for the specified criteria.")]
  EmptyResult,

  #[error("No data available in the store.")]
  EmptyStore,

  #[error("Invalid measurement. {0}")]
  InvalidMeasurement(String),

  #[error("Could not compute {0} over the selected values.")]
  InvalidStatistic(String),

  #[error("Store unavailable: {0}")]
  StoreUnavailable(String),

  #[error("Query timed out after {0} ms.")]
  Timeout(u64),

  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl MeasureDBError {
  /// Machine-readable kind of this error.
  pub fn kind(&self) -> &'static str {
    match self {
      MeasureDBError::MissingField => "missing_field",
      MeasureDBError::InvalidField(_) => "invalid_field",
      MeasureDBError::InvalidDateFormat { .. } => "invalid_date_format",
      MeasureDBError::InvalidTimeout(_) => "invalid_timeout",
      MeasureDBError::InvalidQueryString(_) => "invalid_query",
      MeasureDBError::EmptyResult => "empty_result",
      MeasureDBError::EmptyStore => "empty_store",
      MeasureDBError::InvalidMeasurement(_) => "invalid_measurement",
      MeasureDBError::InvalidStatistic(_) => "invalid_statistic",
      MeasureDBError::StoreUnavailable(_) => "store_unavailable",
      MeasureDBError::Timeout(_) => "timeout",
      MeasureDBError::InvalidConfiguration(_) => "invalid_configuration",
      MeasureDBError::Internal(_) => "internal_error",
    }
  }

  /// The request parameter that caused this error, if there is one.
  pub fn parameter(&self) -> Option<&str> {
    match self {
      MeasureDBError::MissingField | MeasureDBError::InvalidField(_) => Some("field"),
      MeasureDBError::InvalidDateFormat { parameter, .. } => Some(parameter),
      MeasureDBError::InvalidTimeout(_) => Some("timeout"),
      _ => None,
    }
  }

  /// Whether the error was caused by the request itself, and was detected before touching the store.
  pub fn is_validation_error(&self) -> bool {
    matches!(
      self,
      MeasureDBError::MissingField
        | MeasureDBError::InvalidField(_)
        | MeasureDBError::InvalidDateFormat { .. }
        | MeasureDBError::InvalidTimeout(_)
        | MeasureDBError::InvalidQueryString(_)
    )
  }
}

impl From<std::io::Error> for MeasureDBError {
  fn from(error: std::io::Error) -> Self {
    MeasureDBError::StoreUnavailable(error.to_string())
  }
}

impl From<serde_json::Error> for MeasureDBError {
  fn from(error: serde_json::Error) -> Self {
    MeasureDBError::StoreUnavailable(format!("Cannot decode store contents. {}", error))
  }
}

impl From<config::ConfigError> for MeasureDBError {
  fn from(error: config::ConfigError) -> Self {
    MeasureDBError::InvalidConfiguration(error.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_and_parameter() {
    let error = MeasureDBError::InvalidDateFormat {
      parameter: "end_date".to_owned(),
      value: "2024-13-01".to_owned(),
    };
    assert_eq!(error.kind(), "invalid_date_format");
    assert_eq!(error.parameter(), Some("end_date"));
    assert!(error.is_validation_error());

    let error = MeasureDBError::InvalidField("field9".to_owned());
    assert_eq!(error.parameter(), Some("field"));
    assert_eq!(
      error.to_string(),
      "Invalid field name field9. Must be field1, field2, or field3."
    );

    let error = MeasureDBError::InvalidQueryString("duplicate field `field`".to_owned());
    assert_eq!(error.kind(), "invalid_query");
    assert_eq!(error.parameter(), None);
    assert!(error.is_validation_error());

    let error = MeasureDBError::EmptyResult;
    assert_eq!(error.parameter(), None);
    assert!(!error.is_validation_error());
  }

  #[test]
  fn test_io_error_is_store_unavailable() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: MeasureDBError = io_error.into();
    assert_eq!(error.kind(), "store_unavailable");
  }
}
