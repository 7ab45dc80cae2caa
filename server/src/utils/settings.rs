// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use measuredb::utils::config::{ENV_PREFIX, ENV_SEPARATOR};

const DEFAULT_CONFIG_FILE_NAME: &str = "default.toml";

#[derive(Debug, Deserialize)]
/// Settings for the measurement server.
pub struct ServerSettings {
  port: u16,
  host: String,
}

impl ServerSettings {
  /// Get the port.
  pub fn get_port(&self) -> u16 {
    self.port
  }

  /// Get the host.
  pub fn get_host(&self) -> &str {
    &self.host
  }

  /// Get the address to listen on, as `host:port`.
  pub fn get_connection_string(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the server, read from config file.
pub struct Settings {
  server: ServerSettings,
}

impl Settings {
  /// Create Settings from given configuration directory path.
  pub fn new(config_dir_path: &str) -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config_default_file_name = format!("{}/{}", config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    let config_environment_file_name =
      format!("{}/{}.toml", config_dir_path, run_mode.to_lowercase());

    let config = Config::builder()
      .add_source(File::with_name(&config_default_file_name))
      // The run mode file is optional.
      .add_source(File::with_name(&config_environment_file_name).required(false))
      // Eg.. `MEASURE_SERVER__PORT=8080` would set the port.
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator(ENV_SEPARATOR),
      )
      .build()?;

    config.try_deserialize()
  }

  /// Get server settings.
  pub fn get_server_settings(&self) -> &ServerSettings {
    &self.server
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::utils::test_with_env_vars::with_env_vars;

  #[test]
  fn test_settings() {
    with_env_vars(vec![("RUN_MODE", None), ("MEASURE_SERVER__PORT", None)], || {
      let settings = Settings::new("../config").expect("Could not parse config");

      let server_settings = settings.get_server_settings();
      assert_eq!(server_settings.get_port(), 3000);
      assert_eq!(server_settings.get_host(), "0.0.0.0");
      assert_eq!(server_settings.get_connection_string(), "0.0.0.0:3000");
    });
  }

  #[test]
  fn test_settings_from_environment() {
    with_env_vars(
      vec![("RUN_MODE", None), ("MEASURE_SERVER__PORT", Some("8080"))],
      || {
        let settings = Settings::new("../config").expect("Could not parse config");
        assert_eq!(settings.get_server_settings().get_port(), 8080);
      },
    );
  }

  #[test]
  fn test_missing_config_dir() {
    assert!(Settings::new("/nonexistent/measure/config").is_err());
  }
}
