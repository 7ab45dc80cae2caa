// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;

use lazy_static::lazy_static;
use std::sync::Mutex;

lazy_static! {
  // Environment variables are process-wide, so tests touching them run one at a time.
  static ref ENV_LOCK: Mutex<()> = Mutex::new(());
}

/// Restores the saved environment variables when dropped, including while unwinding from a panic.
struct RestoreEnv {
  saved: Vec<(String, Option<String>)>,
}

impl Drop for RestoreEnv {
  fn drop(&mut self) {
    for (key, value) in self.saved.drain(..) {
      match value {
        Some(value) => env::set_var(&key, value),
        None => env::remove_var(&key),
      }
    }
  }
}

/// Runs the closure with the given environment variables set (`Some`) or removed (`None`).
pub fn with_env_vars<F: FnOnce()>(kvs: Vec<(&str, Option<&str>)>, closure: F) {
  // A test that panicked while holding the lock has already restored the environment.
  let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

  let saved = kvs
    .iter()
    .map(|(key, _)| (key.to_string(), env::var(key).ok()))
    .collect();
  let _restore = RestoreEnv { saved };

  for (key, value) in kvs {
    match value {
      Some(value) => env::set_var(key, value),
      None => env::remove_var(key),
    }
  }

  closure();
}
