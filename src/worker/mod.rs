// Worker module - the in-match control loop and everything that runs beside it
// on its own threads.

mod live_data;
mod manager;
mod match_loop;
mod registry;
mod tactics;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::WorkerError;

pub use live_data::{
  LiveClientApi, LiveDataPoller, LiveDataSource, LiveGameSnapshot, SharedGameData, LIVE_CLIENT_URL,
};
pub use manager::{WorkerManager, WorkerState};
pub use match_loop::MatchWorker;
pub use registry::{WorkerFactory, WorkerRegistry};
pub use tactics::{ObserverTactics, Tactics};

const STOP_POLL_SLICE: Duration = Duration::from_millis(25);

/// Shared stop signal. Only ever goes from false to true.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn raise(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_raised(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Sleep for `duration`, waking early if raised. Returns whether it was raised.
  pub fn sleep(&self, duration: Duration) -> bool {
    sleep_unless_raised(&[self], duration)
  }
}

/// Sleep in short slices until `duration` passes or any flag is raised.
pub(crate) fn sleep_unless_raised(flags: &[&StopFlag], duration: Duration) -> bool {
  let deadline = Instant::now() + duration;
  loop {
    if flags.iter().any(|f| f.is_raised()) {
      return true;
    }
    let now = Instant::now();
    if now >= deadline {
      return false;
    }
    std::thread::sleep(STOP_POLL_SLICE.min(deadline - now));
  }
}

/// The long-running in-match control loop. Runs on its own thread and must
/// return promptly once `stop` is raised.
pub trait Worker: Send {
  fn run(self: Box<Self>, stop: StopFlag) -> Result<(), WorkerError>;
}
