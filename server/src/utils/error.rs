// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::StatusCode;
use log::{error, warn};
use serde_json::{json, Value};
use thiserror::Error;

use measuredb::utils::error::MeasureDBError;

#[derive(Debug, Error)]
/// Errors that stop the measurement server from starting.
pub enum ServerError {
  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(#[from] config::ConfigError),

  #[error("Could not open measurement store. {0}")]
  MeasureDB(#[from] MeasureDBError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

/// A failed API request, rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError {
  error: MeasureDBError,
  query: Option<Value>,
}

impl ApiError {
  /// Attach the request parameters, echoed back to the client when nothing matched them.
  pub fn with_query(mut self, query: Value) -> Self {
    self.query = Some(query);
    self
  }

  pub fn status_code(&self) -> StatusCode {
    match &self.error {
      e if e.is_validation_error() => StatusCode::BAD_REQUEST,
      MeasureDBError::EmptyResult | MeasureDBError::EmptyStore => StatusCode::NOT_FOUND,
      MeasureDBError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      MeasureDBError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<MeasureDBError> for ApiError {
  fn from(error: MeasureDBError) -> Self {
    ApiError { error, query: None }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status_code = self.status_code();

    let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
      error!("Internal error while serving request: {}", self.error);
      "Internal server error".to_owned()
    } else {
      if status_code.is_server_error() {
        warn!("Request failed: {}", self.error);
      }
      self.error.to_string()
    };

    let mut body = json!({
      "error": message,
      "errorType": self.error.kind(),
    });
    if let Some(parameter) = self.error.parameter() {
      body["parameter"] = json!(parameter);
    }
    if let Some(query) = self.query {
      if status_code == StatusCode::NOT_FOUND {
        body["query"] = query;
      }
    }

    (status_code, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::body::to_bytes;
  use test_case::test_case;

  async fn body_of(error: ApiError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[test_case(MeasureDBError::MissingField, StatusCode::BAD_REQUEST)]
  #[test_case(MeasureDBError::InvalidField("x".to_owned()), StatusCode::BAD_REQUEST)]
  #[test_case(MeasureDBError::InvalidTimeout("0s".to_owned()), StatusCode::BAD_REQUEST)]
  #[test_case(MeasureDBError::InvalidQueryString("duplicate field `field`".to_owned()), StatusCode::BAD_REQUEST)]
  #[test_case(MeasureDBError::EmptyResult, StatusCode::NOT_FOUND)]
  #[test_case(MeasureDBError::EmptyStore, StatusCode::NOT_FOUND)]
  #[test_case(MeasureDBError::StoreUnavailable("down".to_owned()), StatusCode::SERVICE_UNAVAILABLE)]
  #[test_case(MeasureDBError::Timeout(5000), StatusCode::GATEWAY_TIMEOUT)]
  #[test_case(MeasureDBError::InvalidStatistic("stdDev".to_owned()), StatusCode::INTERNAL_SERVER_ERROR)]
  #[test_case(MeasureDBError::Internal("panic".to_owned()), StatusCode::INTERNAL_SERVER_ERROR)]
  fn test_status_code(error: MeasureDBError, expected: StatusCode) {
    assert_eq!(ApiError::from(error).status_code(), expected);
  }

  #[tokio::test]
  async fn test_validation_body() {
    let error = ApiError::from(MeasureDBError::InvalidDateFormat {
      parameter: "start_date".to_owned(),
      value: "01/02/2024".to_owned(),
    })
    .with_query(json!({"start_date": "01/02/2024"}));

    let (status, body) = body_of(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorType"], "invalid_date_format");
    assert_eq!(body["parameter"], "start_date");
    assert!(body.get("query").is_none());
  }

  #[tokio::test]
  async fn test_empty_result_echoes_query() {
    let query = json!({"field": "field1", "start_date": "2030-01-01", "end_date": null});
    let error = ApiError::from(MeasureDBError::EmptyResult).with_query(query.clone());

    let (status, body) = body_of(error).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No data found for the specified criteria.");
    assert_eq!(body["query"], query);
  }

  #[tokio::test]
  async fn test_internal_error_hides_details() {
    let (status, body) = body_of(ApiError::from(MeasureDBError::Internal("boom".to_owned()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["errorType"], "internal_error");
  }
}
