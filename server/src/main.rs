// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! The measurement server application and interface.
//!
//! The measurement server is an [Axum](https://docs.rs/axum/latest/axum/) web application that answers
//! range queries and statistics over the measurements kept by [MeasureDB](measuredb::MeasureDB).
//!
//! All endpoints live under `/api`, are read-only and keep no state between requests. Validation errors
//! are reported as 400, queries that match nothing as 404, and store failures as 503 (or 504 on timeout),
//! each with a JSON body carrying the error message and its kind.

mod utils;

use std::env;
use std::result::Result;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use hyper::StatusCode;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use measuredb::measurement::field::Field;
use measuredb::query::date_range::DateRange;
use measuredb::query::range_query::{AllFieldsRow, FieldRow};
use measuredb::query::time_range::TimeRange;
use measuredb::stats::metrics::{DateRangeEcho, MetricsResult};
use measuredb::utils::environment::load_env;
use measuredb::utils::error::MeasureDBError;
use measuredb::utils::time::{format_timestamp, parse_timeout};
use measuredb::MeasureDB;

use crate::utils::error::{ApiError, ServerError};
use crate::utils::settings::Settings;
use crate::utils::shutdown::shutdown_signal;

/// Represents application state.
struct AppState {
  measuredb: MeasureDB,
  start_time: Instant,
}

#[derive(Debug, Deserialize, Serialize)]
/// Represents a measurements query. Every parameter is optional here, and validated by the handlers.
struct MeasurementsQuery {
  field: Option<String>,
  start_date: Option<String>,
  end_date: Option<String>,
  timeout: Option<String>,
}

impl MeasurementsQuery {
  /// Unwrap the extracted query string. A malformed one, e.g. with a repeated parameter, is a validation error.
  fn from_extracted(
    extracted: Result<Query<MeasurementsQuery>, QueryRejection>,
  ) -> Result<MeasurementsQuery, MeasureDBError> {
    extracted
      .map(|Query(query)| query)
      .map_err(|rejection| MeasureDBError::InvalidQueryString(rejection.body_text()))
  }

  fn parse_field(&self) -> Result<Field, MeasureDBError> {
    Field::parse_param(self.field.as_deref())
  }

  fn parse_time_range(&self) -> Result<TimeRange, MeasureDBError> {
    TimeRange::from_dates(self.start_date.as_deref(), self.end_date.as_deref())
  }

  /// Get the measuredb to run this query with, honoring a per-request timeout if one was given.
  fn measuredb_for(&self, measuredb: &MeasureDB) -> Result<MeasureDB, MeasureDBError> {
    match self.timeout.as_deref().filter(|t| !t.is_empty()) {
      Some(timeout) => Ok(measuredb.with_timeout(parse_timeout(timeout)?)),
      None => Ok(measuredb.clone()),
    }
  }

  /// The query parameters, as echoed back when nothing matched them.
  fn echo(&self, with_field: bool) -> Value {
    let mut echo = json!({
      "start_date": self.start_date,
      "end_date": self.end_date,
    });
    if with_field {
      echo["field"] = json!(self.field);
    }
    echo
  }
}

/// Axum application for the measurement server.
fn app(measuredb: MeasureDB) -> Router {
  let shared_state = Arc::new(AppState {
    measuredb,
    start_time: Instant::now(),
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

  Router::new()
    .route("/ping", get(ping))
    .route("/api", get(api_index))
    .route("/api/health", get(health))
    .route("/api/measurements", get(get_measurements))
    .route("/api/measurements/metrics", get(get_metrics))
    .route("/api/measurements/all-fields", get(get_all_fields))
    .route("/api/measurements/date-range", get(get_date_range))
    .fallback(not_found)
    // ---
    // State that is passed to each request.
    .with_state(shared_state)
    // ---
    // Layer for tracing in debug mode.
    .layer(TraceLayer::new_for_http())
    .layer(cors)
}

async fn run_server() -> Result<(), ServerError> {
  // Config directory path is relative to the current directory, and set in environment variable "MEASURE_CONFIG_DIR_PATH".
  // Defaults to "config" if not set.
  let config_dir_path = &env::var("MEASURE_CONFIG_DIR_PATH").unwrap_or_else(|_| "config".to_owned());

  let settings = Settings::new(config_dir_path)?;
  let measuredb = MeasureDB::new(config_dir_path)?;

  let app = app(measuredb);

  // Start server.
  let connection_string = settings.get_server_settings().get_connection_string();
  let listener = TcpListener::bind(&connection_string).await?;

  info!(
    "Starting measurement server on {}. Use Ctrl-C or SIGTERM to gracefully exit...",
    connection_string
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("Completed measurement server shutdown");
  Ok(())
}

/// Program entry point.
fn main() {
  // Load environment variables from ".env" and ".env-creds" file.
  load_env();

  // If log level isn't set, set it to info.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info")
  }

  // Set up logging.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // Set the number of threads to be 1 less than the number of CPUs (or 1 if there are fewer than 2 CPUs).
  let num_threads = std::cmp::max(1, num_cpus::get().saturating_sub(1));

  let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(num_threads)
    .enable_all()
    .build()
  {
    Ok(runtime) => runtime,
    Err(err) => {
      error!("Could not start the async runtime: {}", err);
      std::process::exit(1);
    }
  };

  if let Err(err) = runtime.block_on(run_server()) {
    error!("Measurement server failed: {}", err);
    std::process::exit(1);
  }
}

/// Ping to check if the server is up.
async fn ping(State(_state): State<Arc<AppState>>) -> String {
  "OK".to_owned()
}

/// Describe the API.
async fn api_index() -> Json<Value> {
  let available_fields: Vec<&str> = Field::ALL.iter().map(Field::as_str).collect();

  Json(json!({
    "message": "Measurement Analytics API",
    "version": env!("CARGO_PKG_VERSION"),
    "endpoints": {
      "measurements": "/api/measurements?field={field}&start_date={YYYY-MM-DD}&end_date={YYYY-MM-DD}",
      "metrics": "/api/measurements/metrics?field={field}&start_date={YYYY-MM-DD}&end_date={YYYY-MM-DD}",
      "allFields": "/api/measurements/all-fields?start_date={YYYY-MM-DD}&end_date={YYYY-MM-DD}",
      "dateRange": "/api/measurements/date-range",
      "health": "/api/health",
    },
    "availableFields": available_fields,
  }))
}

/// Report the server uptime and whether the store answers.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
  let database = match state.measuredb.count().await {
    Ok(_) => "connected",
    Err(err) => {
      error!("Health check could not reach the store: {}", err);
      "disconnected"
    }
  };

  Json(json!({
    "status": "OK",
    "timestamp": format_timestamp(&Utc::now()),
    "uptime": state.start_time.elapsed().as_secs_f64(),
    "database": database,
  }))
}

/// Get the time series of one field.
async fn get_measurements(
  State(state): State<Arc<AppState>>,
  query: Result<Query<MeasurementsQuery>, QueryRejection>,
) -> Result<Json<Vec<FieldRow>>, ApiError> {
  let query = MeasurementsQuery::from_extracted(query)?;
  debug!("MAIN: Get measurements for HTTP query: {:?}", query);

  let field = query.parse_field()?;
  let range = query.parse_time_range()?;
  let measuredb = query.measuredb_for(&state.measuredb)?;

  let rows = measuredb
    .get_measurements(field, range)
    .await
    .map_err(|err| ApiError::from(err).with_query(query.echo(true)))?;

  debug!("Found {} measurements of {}", rows.len(), field);
  Ok(Json(rows))
}

/// Get statistics of one field.
async fn get_metrics(
  State(state): State<Arc<AppState>>,
  query: Result<Query<MeasurementsQuery>, QueryRejection>,
) -> Result<Json<MetricsResult>, ApiError> {
  let query = MeasurementsQuery::from_extracted(query)?;
  debug!("MAIN: Get metrics for HTTP query: {:?}", query);

  let field = query.parse_field()?;
  let range = query.parse_time_range()?;
  let measuredb = query.measuredb_for(&state.measuredb)?;

  let metrics = measuredb
    .get_metrics(field, range)
    .await
    .map_err(|err| ApiError::from(err).with_query(query.echo(true)))?;

  let date_range = DateRangeEcho::from_dates(query.start_date.as_deref(), query.end_date.as_deref());
  Ok(Json(metrics.to_result(date_range)))
}

/// Get every field of the measurements.
async fn get_all_fields(
  State(state): State<Arc<AppState>>,
  query: Result<Query<MeasurementsQuery>, QueryRejection>,
) -> Result<Json<Vec<AllFieldsRow>>, ApiError> {
  let query = MeasurementsQuery::from_extracted(query)?;
  debug!("MAIN: Get all fields for HTTP query: {:?}", query);

  let range = query.parse_time_range()?;
  let measuredb = query.measuredb_for(&state.measuredb)?;

  let rows = measuredb
    .get_all_fields(range)
    .await
    .map_err(|err| ApiError::from(err).with_query(query.echo(false)))?;

  Ok(Json(rows))
}

/// Get the dates of the earliest and latest measurements.
async fn get_date_range(State(state): State<Arc<AppState>>) -> Result<Json<DateRange>, ApiError> {
  let date_range = state.measuredb.get_date_range().await?;
  Ok(Json(date_range))
}

async fn not_found() -> impl IntoResponse {
  (
    StatusCode::NOT_FOUND,
    Json(json!({ "error": "API endpoint not found" })),
  )
}
