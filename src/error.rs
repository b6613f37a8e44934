// Error types shared across the gateway, config, worker and orchestrator layers

use std::path::PathBuf;
use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Failures of a single control-plane request.
#[derive(Debug, Error)]
pub enum LcuError {
  /// No live connection, or the client refused the TCP connection.
  #[error("league client unreachable: {0}")]
  Unreachable(String),

  #[error("league client request timed out: {0}")]
  Timeout(String),

  #[error("league client returned {0}")]
  ClientError(StatusCode),

  #[error("could not decode league client response: {0}")]
  Decode(String),
}

impl LcuError {
  /// Errors worth waiting out: the client is restarting or overloaded.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Unreachable(_) | Self::Timeout(_) => true,
      Self::ClientError(status) => status.is_server_error(),
      Self::Decode(_) => false,
    }
  }
}

impl From<reqwest::Error> for LcuError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      Self::Timeout(err.to_string())
    } else if let Some(status) = err.status() {
      Self::ClientError(status)
    } else if err.is_decode() || err.is_body() {
      Self::Decode(err.to_string())
    } else {
      Self::Unreachable(err.to_string())
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing config at {0}")]
  Missing(PathBuf),

  #[error("config io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("config parse error: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("unknown game mode: {0}")]
  UnknownMode(String),
}

#[derive(Debug, Error)]
pub enum LiveDataError {
  #[error("live client request failed: {0}")]
  Request(String),

  #[error("live client returned {0}")]
  Status(StatusCode),

  #[error("live data poller is already running")]
  AlreadyRunning,

  #[error("live data poller did not exit within {0:?}")]
  StopTimeout(Duration),
}

#[derive(Debug, Error)]
pub enum WorkerError {
  #[error("a match worker is already running")]
  AlreadyRunning,

  #[error("match worker did not exit within {timeout:?}")]
  Hung { timeout: Duration },

  #[error("no worker registered for mode {0}")]
  UnregisteredMode(String),

  #[error("worker config error: {0}")]
  Config(#[from] ConfigError),

  #[error("failed to spawn worker thread: {0}")]
  Spawn(std::io::Error),

  #[error("live data error: {0}")]
  LiveData(#[from] LiveDataError),
}

/// Broken invariants the phase state machine depends on. These escape a handler
/// and end the process through the shutdown coordinator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
  #[error("worker lifecycle violation: {0}")]
  Worker(#[from] WorkerError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transient_classification() {
    assert!(LcuError::Unreachable("gone".into()).is_transient());
    assert!(LcuError::Timeout("slow".into()).is_transient());
    assert!(LcuError::ClientError(StatusCode::SERVICE_UNAVAILABLE).is_transient());
    assert!(!LcuError::ClientError(StatusCode::BAD_REQUEST).is_transient());
    assert!(!LcuError::Decode("junk".into()).is_transient());
  }
}
