// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::path::PathBuf;

use log::debug;

/// Files holding environment variables, e.g. `MEASURE_SERVER__PORT=8080`, one per line.
const ENV_FILE_NAMES: [&str; 2] = [".env", ".env-creds"];

/// Load environment variables from the ".env" and ".env-creds" files in the current directory or its
/// parents. Variables already set in the process environment are left as they are.
///
/// Returns the paths of the files that were found and loaded.
pub fn load_env() -> Vec<PathBuf> {
  ENV_FILE_NAMES
    .iter()
    .filter_map(|file_name| match dotenv::from_filename(file_name) {
      Ok(path) => {
        debug!("Loaded environment variables from {}", path.display());
        Some(path)
      }
      Err(_) => None,
    })
    .collect()
}
