// Shutdown coordinator - ordered, best-effort teardown that always ends in
// process exit.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::session::Session;
use crate::config::ConfigStore;
use crate::lcu::GatewayControl;
use crate::worker::WorkerManager;

/// Ordered stop: operator request or end of the match loop.
pub const EXIT_CLEAN: i32 = 0;
/// A handler broke a lifecycle contract, or teardown could not proceed.
pub const EXIT_FATAL: i32 = 1;

/// How the process actually terminates. Swapped out in tests.
pub trait ProcessExit: Send + Sync {
  fn exit(&self, code: i32);
}

#[derive(Debug, Default)]
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
  fn exit(&self, code: i32) {
    std::process::exit(code)
  }
}

pub struct ShutdownCoordinator {
  session: Arc<Session>,
  workers: Arc<WorkerManager>,
  config: ConfigStore,
  gateway: OnceCell<Arc<dyn GatewayControl>>,
  exit: Arc<dyn ProcessExit>,
  finished: CancellationToken,
}

impl ShutdownCoordinator {
  pub fn new(
    session: Arc<Session>,
    workers: Arc<WorkerManager>,
    config: ConfigStore,
    exit: Arc<dyn ProcessExit>,
  ) -> Self {
    Self {
      session,
      workers,
      config,
      gateway: OnceCell::new(),
      exit,
      finished: CancellationToken::new(),
    }
  }

  /// The gateway is started after the handlers exist, so it is attached late.
  pub fn attach_gateway(&self, gateway: Arc<dyn GatewayControl>) {
    if self.gateway.set(gateway).is_err() {
      warn!("[Shutdown] Gateway already attached");
    }
  }

  /// Tear everything down and exit with `code`. Later callers wait for the
  /// first one to finish, and the first caller's code wins.
  pub async fn shutdown(&self, reason: &str, code: i32) {
    if !self.session.request_shutdown() {
      debug!("[Shutdown] Already shutting down ({})", reason);
      self.finished.cancelled().await;
      return;
    }
    warn!("[Shutdown] Shutting down: {}", reason);
    let timings = self.config.timings();

    self.workers.request_stop();

    match self.gateway.get() {
      Some(gateway) => {
        if !gateway.close(timings.gateway_close_timeout()).await {
          warn!(
            "[Shutdown] Gateway did not confirm close within {:?}",
            timings.gateway_close_timeout()
          );
        }
      }
      None => debug!("[Shutdown] No gateway to close"),
    }

    if let Err(e) = self
      .workers
      .await_completion(timings.shutdown_worker_timeout())
      .await
    {
      error!("[Shutdown] {}", e);
    }

    info!("[Shutdown] Exiting with status {}", code);
    self.finished.cancel();
    self.exit.exit(code);
  }

  /// Exit immediately, skipping the ordered teardown.
  pub fn force_exit(&self, code: i32) {
    error!("[Shutdown] Forcing exit with status {}", code);
    self.exit.exit(code);
  }
}
