// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE_NAME: &str = "default.toml";

/// Prefix for environment variables overriding settings. Sections and keys are separated by
/// a double underscore, e.g. `MEASURE_MEASUREDB__QUERY_TIMEOUT_MILLIS=2000`.
pub const ENV_PREFIX: &str = "measure";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Where measurements are kept.
pub enum StorageType {
  /// Zstd-compressed json file on local disk.
  File,

  /// Process memory only. Contents are lost on restart.
  Memory,
}

#[derive(Debug, Deserialize)]
/// Settings for measuredb.
pub struct MeasureDBSettings {
  storage_type: StorageType,
  data_file_path: String,
  query_timeout_millis: u64,
}

impl MeasureDBSettings {
  /// Get the storage type.
  pub fn get_storage_type(&self) -> StorageType {
    self.storage_type
  }

  /// Get the path of the file where measurements are persisted.
  pub fn get_data_file_path(&self) -> &str {
    self.data_file_path.as_str()
  }

  /// Get the time after which a query is abandoned.
  pub fn get_query_timeout(&self) -> Duration {
    Duration::from_millis(self.query_timeout_millis)
  }

  pub fn get_default_config_file_name() -> &'static str {
    DEFAULT_CONFIG_FILE_NAME
  }
}

#[derive(Debug, Deserialize)]
/// Settings for measuredb, read from config file.
pub struct Settings {
  measuredb: MeasureDBSettings,
}

impl Settings {
  /// Create Settings from given configuration directory path. The run mode is read from `RUN_MODE`.
  pub fn new(config_dir_path: &str) -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    Self::new_with_run_mode(config_dir_path, &run_mode)
  }

  /// Create Settings from given configuration directory path, overlaying `<run_mode>.toml` if present.
  pub fn new_with_run_mode(config_dir_path: &str, run_mode: &str) -> Result<Self, ConfigError> {
    let config_default_file_name = format!("{}/{}", config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    let config_environment_file_name =
      format!("{}/{}.toml", config_dir_path, run_mode.to_lowercase());

    let settings: Settings = Config::builder()
      .add_source(File::with_name(&config_default_file_name))
      // The run mode file is optional.
      .add_source(File::with_name(&config_environment_file_name).required(false))
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator(ENV_SEPARATOR),
      )
      .build()?
      .try_deserialize()?;

    if settings.measuredb.query_timeout_millis == 0 {
      return Err(ConfigError::Message(
        "query_timeout_millis must be greater than 0".to_owned(),
      ));
    }

    Ok(settings)
  }

  /// Get measuredb settings.
  pub fn get_measuredb_settings(&self) -> &MeasureDBSettings {
    &self.measuredb
  }
}

/// Initialize env_logger for tests. Safe to call from multiple tests.
pub fn config_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::fs::File;
  use std::io::Write;
  use std::path::Path;

  use tempdir::TempDir;

  fn write_config(dir: &Path, file_name: &str, lines: &[&str]) {
    let mut file = File::create(dir.join(file_name)).unwrap();
    for line in lines {
      file.write_all(line.as_bytes()).unwrap();
      file.write_all(b"\n").unwrap();
    }
  }

  #[test]
  fn test_settings() {
    let config_dir = TempDir::new("config_test").unwrap();
    let config_dir_path = config_dir.path().to_str().unwrap();

    // Reading from an empty directory should be an error.
    assert!(Settings::new_with_run_mode(config_dir_path, "development").is_err());

    write_config(
      config_dir.path(),
      DEFAULT_CONFIG_FILE_NAME,
      &[
        "[measuredb]",
        "storage_type = \"file\"",
        "data_file_path = \"/var/measure/measurements.json.zst\"",
        "query_timeout_millis = 5000",
      ],
    );

    let settings = Settings::new_with_run_mode(config_dir_path, "development").unwrap();
    let measuredb_settings = settings.get_measuredb_settings();
    assert_eq!(measuredb_settings.get_storage_type(), StorageType::File);
    assert_eq!(
      measuredb_settings.get_data_file_path(),
      "/var/measure/measurements.json.zst"
    );
    assert_eq!(
      measuredb_settings.get_query_timeout(),
      Duration::from_millis(5000)
    );

    // The run mode file overrides only the keys it sets.
    write_config(
      config_dir.path(),
      "settingstest.toml",
      &[
        "[measuredb]",
        "storage_type = \"memory\"",
        "query_timeout_millis = 250",
      ],
    );
    let settings = Settings::new_with_run_mode(config_dir_path, "SETTINGSTEST").unwrap();
    let measuredb_settings = settings.get_measuredb_settings();
    assert_eq!(measuredb_settings.get_storage_type(), StorageType::Memory);
    assert_eq!(
      measuredb_settings.get_query_timeout(),
      Duration::from_millis(250)
    );
    assert_eq!(
      measuredb_settings.get_data_file_path(),
      "/var/measure/measurements.json.zst"
    );
  }

  #[test]
  fn test_zero_timeout_is_rejected() {
    let config_dir = TempDir::new("config_test").unwrap();
    write_config(
      config_dir.path(),
      DEFAULT_CONFIG_FILE_NAME,
      &[
        "[measuredb]",
        "storage_type = \"memory\"",
        "data_file_path = \"unused\"",
        "query_timeout_millis = 0",
      ],
    );
    let result = Settings::new_with_run_mode(config_dir.path().to_str().unwrap(), "development");
    assert!(result.is_err());
  }

  #[test]
  fn test_unknown_storage_type_is_rejected() {
    let config_dir = TempDir::new("config_test").unwrap();
    write_config(
      config_dir.path(),
      DEFAULT_CONFIG_FILE_NAME,
      &[
        "[measuredb]",
        "storage_type = \"mongodb\"",
        "data_file_path = \"unused\"",
        "query_timeout_millis = 100",
      ],
    );
    let result = Settings::new_with_run_mode(config_dir.path().to_str().unwrap(), "development");
    assert!(result.is_err());
  }
}
