// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use log::{error, info};
use tokio::signal;

/// Resolves when the process receives Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(err) = signal::ctrl_c().await {
      error!("Could not install Ctrl-C handler: {}", err);
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(err) => {
        error!("Could not install SIGTERM handler: {}", err);
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("Received Ctrl-C"),
    _ = terminate => info!("Received SIGTERM"),
  }
}
