use std::time::Duration;
use tokio::sync::watch;

/// Shared open/closed switch consulted before any event is handled.
/// Waiting on it suspends only the waiting task.
#[derive(Debug)]
pub struct PauseGate {
  state: watch::Sender<bool>,
}

impl Default for PauseGate {
  fn default() -> Self {
    Self::new()
  }
}

impl PauseGate {
  /// Starts open.
  pub fn new() -> Self {
    let (state, _) = watch::channel(true);
    Self { state }
  }

  pub fn open(&self) {
    self.state.send_replace(true);
  }

  pub fn close(&self) {
    self.state.send_replace(false);
  }

  pub fn is_open(&self) -> bool {
    *self.state.borrow()
  }

  pub async fn await_open(&self) {
    let mut rx = self.state.subscribe();
    // The sender lives in `self`, so this can't fail while we're borrowed.
    let _ = rx.wait_for(|open| *open).await;
  }

  /// Like `await_open`, giving up after `ceiling`. Returns whether it opened.
  pub async fn await_open_within(&self, ceiling: Duration) -> bool {
    tokio::time::timeout(ceiling, self.await_open()).await.is_ok()
  }
}
