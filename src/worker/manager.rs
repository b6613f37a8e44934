// Worker lifecycle manager - at most one match worker thread at a time, with a
// bounded wait for it to finish.

use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::registry::WorkerRegistry;
use super::StopFlag;
use crate::config::{ConfigStore, GameMode};
use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  Idle,
  Running,
  /// Did not finish within an await bound. Holds the slot until a later
  /// await sees it finish.
  Hung,
}

struct RunningWorker {
  id: Uuid,
  mode: GameMode,
  stop: StopFlag,
  thread: JoinHandle<()>,
  done: watch::Receiver<bool>,
  hung: bool,
}

impl RunningWorker {
  fn is_live(&self) -> bool {
    self.hung || !self.thread.is_finished()
  }

  fn reap(self) {
    if self.thread.join().is_err() {
      warn!("[Worker] {} worker {} panicked", self.mode, self.id);
    }
  }
}

/// Marks the worker finished however `run` exits, panics included.
struct DoneGuard(watch::Sender<bool>);

impl Drop for DoneGuard {
  fn drop(&mut self) {
    self.0.send_replace(true);
  }
}

pub struct WorkerManager {
  registry: WorkerRegistry,
  config: ConfigStore,
  slot: Mutex<Option<RunningWorker>>,
}

impl WorkerManager {
  pub fn new(registry: WorkerRegistry, config: ConfigStore) -> Self {
    Self {
      registry,
      config,
      slot: Mutex::new(None),
    }
  }

  fn slot(&self) -> MutexGuard<'_, Option<RunningWorker>> {
    self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Start a worker for the currently configured game mode.
  pub fn start(&self) -> Result<Uuid, WorkerError> {
    let config = self.config.load()?;
    let mode = config.general.game_mode()?;
    let factory = self
      .registry
      .get(mode)
      .ok_or_else(|| WorkerError::UnregisteredMode(mode.to_string()))?;

    let mut slot = self.slot();
    if slot.as_ref().is_some_and(RunningWorker::is_live) {
      return Err(WorkerError::AlreadyRunning);
    }
    if let Some(finished) = slot.take() {
      finished.reap();
    }

    let worker = factory.create(&config);
    let id = Uuid::new_v4();
    let stop = StopFlag::new();
    let (done_tx, done) = watch::channel(false);
    let thread_stop = stop.clone();

    let thread = thread::Builder::new()
      .name(format!("match-worker-{}", mode))
      .spawn(move || {
        let _done = DoneGuard(done_tx);
        match worker.run(thread_stop) {
          Ok(()) => info!("[Worker] {} worker {} finished", mode, id),
          Err(e) => error!("[Worker] {} worker {} failed: {}", mode, id, e),
        }
      })
      .map_err(WorkerError::Spawn)?;

    info!("[Worker] Started {} worker {}", mode, id);
    *slot = Some(RunningWorker {
      id,
      mode,
      stop,
      thread,
      done,
      hung: false,
    });
    Ok(id)
  }

  /// Raise the current worker's stop flag. Does not wait.
  pub fn request_stop(&self) {
    match self.slot().as_ref() {
      Some(worker) => {
        info!("[Worker] Requesting {} worker {} to stop", worker.mode, worker.id);
        worker.stop.raise();
      }
      None => debug!("[Worker] Stop requested with no worker running"),
    }
  }

  /// Wait up to `timeout` for the current worker to finish. Returns immediately
  /// when none is running. On timeout the worker is marked hung and kept.
  pub async fn await_completion(&self, timeout: Duration) -> Result<(), WorkerError> {
    let (id, mut done) = match self.slot().as_ref() {
      Some(worker) => (worker.id, worker.done.clone()),
      None => return Ok(()),
    };

    let finished = tokio::time::timeout(timeout, done.wait_for(|d| *d))
      .await
      .is_ok();

    let mut slot = self.slot();
    if slot.as_ref().map(|w| w.id) != Some(id) {
      return Ok(());
    }
    if finished {
      if let Some(worker) = slot.take() {
        worker.reap();
      }
      Ok(())
    } else {
      if let Some(worker) = slot.as_mut() {
        worker.hung = true;
      }
      error!("[Worker] Worker {} did not finish within {:?}", id, timeout);
      Err(WorkerError::Hung { timeout })
    }
  }

  pub fn state(&self) -> WorkerState {
    match self.slot().as_ref() {
      None => WorkerState::Idle,
      Some(w) if w.hung => WorkerState::Hung,
      Some(w) if !w.thread.is_finished() => WorkerState::Running,
      Some(_) => WorkerState::Idle,
    }
  }

  pub fn is_running(&self) -> bool {
    self.state() != WorkerState::Idle
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::worker::{Worker, WorkerFactory};
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use std::time::Instant;

  /// Runs until stopped, or for `ignore_stop_for` regardless of the flag.
  struct FakeWorker {
    ignore_stop_for: Option<Duration>,
    runs: Arc<AtomicUsize>,
  }

  impl Worker for FakeWorker {
    fn run(self: Box<Self>, stop: StopFlag) -> Result<(), WorkerError> {
      self.runs.fetch_add(1, Ordering::SeqCst);
      match self.ignore_stop_for {
        Some(d) => thread::sleep(d),
        None => while !stop.sleep(Duration::from_millis(5)) {},
      }
      Ok(())
    }
  }

  fn manager(dir: &tempfile::TempDir, ignore_stop_for: Option<Duration>) -> (WorkerManager, Arc<AtomicUsize>) {
    let path = dir.path().join("config.json");
    std::fs::write(&path, json!({"General": {"selected_game_mode": "test"}}).to_string()).unwrap();

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let factory: Arc<dyn WorkerFactory> = Arc::new(move |_: &AppConfig| -> Box<dyn Worker> {
      Box::new(FakeWorker {
        ignore_stop_for,
        runs: counter.clone(),
      })
    });
    let mut registry = WorkerRegistry::new();
    registry.register(GameMode::Test, factory);
    (WorkerManager::new(registry, ConfigStore::new(path)), runs)
  }

  /// Test: a second start while one is live is rejected
  /// Expected: AlreadyRunning, and only one worker ever ran
  #[tokio::test]
  async fn test_second_start_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, runs) = manager(&dir, None);

    manager.start().unwrap();
    assert!(matches!(manager.start(), Err(WorkerError::AlreadyRunning)));
    assert_eq!(manager.state(), WorkerState::Running);

    manager.request_stop();
    manager.await_completion(Duration::from_secs(2)).await.unwrap();
    assert_eq!(manager.state(), WorkerState::Idle);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  /// Test: restart after completion
  /// Expected: the finished worker is reaped and a new one starts with a fresh stop flag
  #[tokio::test]
  async fn test_restart_after_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, runs) = manager(&dir, None);

    let first = manager.start().unwrap();
    manager.request_stop();
    manager.await_completion(Duration::from_secs(2)).await.unwrap();

    let second = manager.start().unwrap();
    assert_ne!(first, second);
    // Raised flag from the first run must not leak into the second.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(manager.state(), WorkerState::Running);

    manager.request_stop();
    manager.await_completion(Duration::from_secs(2)).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
  }

  /// Test: await with nothing running
  /// Expected: returns Ok immediately
  #[tokio::test]
  async fn test_await_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _) = manager(&dir, None);
    manager.request_stop();
    manager.await_completion(Duration::from_millis(10)).await.unwrap();
    assert!(!manager.is_running());
  }

  /// Test: worker ignores the stop flag past the bound
  /// Expected: Hung returned close to the bound, further starts rejected until it exits
  #[tokio::test]
  async fn test_hung_worker_detected_within_bound() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _) = manager(&dir, Some(Duration::from_millis(600)));

    manager.start().unwrap();
    manager.request_stop();

    let started = Instant::now();
    let res = manager.await_completion(Duration::from_millis(50)).await;
    assert!(matches!(res, Err(WorkerError::Hung { .. })));
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(manager.state(), WorkerState::Hung);
    assert!(matches!(manager.start(), Err(WorkerError::AlreadyRunning)));

    manager.await_completion(Duration::from_secs(3)).await.unwrap();
    assert_eq!(manager.state(), WorkerState::Idle);
  }

  /// Test: a hung worker's thread exits without anyone awaiting it
  /// Expected: still reported Hung and running, and starts stay rejected until
  /// an await observes the exit
  #[tokio::test]
  async fn test_hung_state_agrees_with_start() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, runs) = manager(&dir, Some(Duration::from_millis(100)));

    manager.start().unwrap();
    let res = manager.await_completion(Duration::from_millis(10)).await;
    assert!(matches!(res, Err(WorkerError::Hung { .. })));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(manager.state(), WorkerState::Hung);
    assert!(manager.is_running());
    assert!(matches!(manager.start(), Err(WorkerError::AlreadyRunning)));

    manager.await_completion(Duration::from_millis(50)).await.unwrap();
    assert_eq!(manager.state(), WorkerState::Idle);
    manager.start().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
  }

  /// Test: configured mode with no registered factory
  /// Expected: UnregisteredMode, nothing started
  #[tokio::test]
  async fn test_unregistered_mode() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, runs) = manager(&dir, None);
    ConfigStore::new(dir.path().join("config.json"))
      .set_selected_game_mode(GameMode::Arena)
      .unwrap();

    assert!(matches!(manager.start(), Err(WorkerError::UnregisteredMode(_))));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
  }
}
