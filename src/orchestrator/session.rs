// Per-process orchestration state: last acted-on phase, pause gate, shutdown flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::gate::PauseGate;
use super::phase::GameflowPhase;

#[derive(Debug, Default)]
pub struct Session {
  last_phase: Mutex<Option<GameflowPhase>>,
  gate: PauseGate,
  shutdown_requested: AtomicBool,
  shutdown: CancellationToken,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record `phase` and report whether it differs from the last one seen.
  /// Equal phases are duplicates and must not be acted on.
  pub fn observe_phase(&self, phase: &GameflowPhase) -> bool {
    let mut last = self.last_phase.lock().unwrap_or_else(|p| p.into_inner());
    if last.as_ref() == Some(phase) {
      return false;
    }
    *last = Some(phase.clone());
    true
  }

  pub fn last_phase(&self) -> Option<GameflowPhase> {
    self.last_phase.lock().unwrap_or_else(|p| p.into_inner()).clone()
  }

  /// Forget the last phase so the next observation is always acted on.
  pub fn reset_phase(&self) {
    *self.last_phase.lock().unwrap_or_else(|p| p.into_inner()) = None;
  }

  pub fn gate(&self) -> &PauseGate {
    &self.gate
  }

  /// Set the shutdown flag. Returns true only for the first caller.
  pub fn request_shutdown(&self) -> bool {
    let first = !self.shutdown_requested.swap(true, Ordering::SeqCst);
    self.shutdown.cancel();
    first
  }

  pub fn is_shutdown_requested(&self) -> bool {
    self.shutdown_requested.load(Ordering::SeqCst)
  }

  /// Resolves once shutdown has been requested.
  pub async fn shutdown_requested(&self) {
    self.shutdown.cancelled().await
  }
}
