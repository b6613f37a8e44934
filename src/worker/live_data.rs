// Live match data - polled from the game's local HTTP endpoint on a dedicated
// thread and shared with the control loop under a lock.

use serde::Deserialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{sleep_unless_raised, StopFlag};
use crate::error::LiveDataError;

pub const LIVE_CLIENT_URL: &str = "https://127.0.0.1:2999/liveclientdata";

const FETCH_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameSnapshot {
  #[serde(default)]
  pub active_player: ActivePlayer,
  #[serde(default)]
  pub events: EventLog,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePlayer {
  #[serde(default)]
  pub level: u32,
  #[serde(default)]
  pub champion_stats: ChampionStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionStats {
  #[serde(default)]
  pub current_health: f64,
  #[serde(default)]
  pub max_health: f64,
  #[serde(default)]
  pub attack_range: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventLog {
  #[serde(rename = "Events", default)]
  pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameEvent {
  #[serde(rename = "EventName")]
  pub name: String,
}

impl LiveGameSnapshot {
  fn has_event(&self, name: &str) -> bool {
    self.events.events.iter().any(|e| e.name == name)
  }

  pub fn is_game_started(&self) -> bool {
    self.has_event("GameStart")
  }

  pub fn is_game_ended(&self) -> bool {
    self.has_event("GameEnd")
  }
}

/// Latest snapshot, written by the poller and read by the control loop.
/// Every read and update goes through the lock.
pub type SharedGameData = Arc<Mutex<Option<LiveGameSnapshot>>>;

pub trait LiveDataSource: Send + Sync {
  fn fetch(&self) -> Result<LiveGameSnapshot, LiveDataError>;
}

/// Blocking client for `/liveclientdata/allgamedata`. Build it on the thread
/// that uses it, never inside the async runtime.
pub struct LiveClientApi {
  http: reqwest::blocking::Client,
  url: String,
}

impl LiveClientApi {
  pub fn new() -> Result<Self, LiveDataError> {
    let http = reqwest::blocking::Client::builder()
      .danger_accept_invalid_certs(true)
      .timeout(Duration::from_secs(5))
      .build()
      .map_err(|e| LiveDataError::Request(e.to_string()))?;
    Ok(Self {
      http,
      url: format!("{}/allgamedata", LIVE_CLIENT_URL),
    })
  }
}

impl LiveDataSource for LiveClientApi {
  fn fetch(&self) -> Result<LiveGameSnapshot, LiveDataError> {
    let resp = self
      .http
      .get(&self.url)
      .send()
      .map_err(|e| LiveDataError::Request(e.to_string()))?;
    if !resp.status().is_success() {
      return Err(LiveDataError::Status(resp.status()));
    }
    resp
      .json::<LiveGameSnapshot>()
      .map_err(|e| LiveDataError::Request(e.to_string()))
  }
}

struct PollerThread {
  handle: JoinHandle<()>,
  // Disconnects when the thread exits, including by panic.
  exited: mpsc::Receiver<()>,
}

/// Owns the polling thread. Stops when either the worker's stop flag or its
/// own internal flag is raised.
pub struct LiveDataPoller {
  stop: StopFlag,
  internal: StopFlag,
  thread: Option<PollerThread>,
}

impl LiveDataPoller {
  pub fn new(stop: StopFlag) -> Self {
    Self {
      stop,
      internal: StopFlag::new(),
      thread: None,
    }
  }

  pub fn is_running(&self) -> bool {
    self
      .thread
      .as_ref()
      .map(|t| !t.handle.is_finished())
      .unwrap_or(false)
  }

  pub fn start(
    &mut self,
    source: Arc<dyn LiveDataSource>,
    shared: SharedGameData,
    interval: Duration,
  ) -> Result<(), LiveDataError> {
    if self.is_running() {
      error!("[Worker] Polling thread is already running.");
      return Err(LiveDataError::AlreadyRunning);
    }

    self.internal = StopFlag::new();
    let stop = self.stop.clone();
    let internal = self.internal.clone();
    let (exit_tx, exited) = mpsc::channel::<()>();

    let handle = thread::Builder::new()
      .name("live-data-poller".to_string())
      .spawn(move || {
        let _exit = exit_tx;
        poll_loop(source.as_ref(), &shared, &stop, &internal, interval);
      })
      .map_err(|e| LiveDataError::Request(format!("failed to spawn poller: {}", e)))?;

    self.thread = Some(PollerThread { handle, exited });
    Ok(())
  }

  /// Signal the thread and wait up to `timeout` for it to exit.
  pub fn stop(&mut self, timeout: Duration) -> Result<(), LiveDataError> {
    self.internal.raise();
    let Some(thread) = self.thread.take() else {
      info!("[Worker] Polling thread is not running, nothing to stop.");
      return Ok(());
    };

    match thread.exited.recv_timeout(timeout) {
      Ok(()) | Err(RecvTimeoutError::Disconnected) => {
        if thread.handle.join().is_err() {
          warn!("[Worker] Polling thread panicked");
        }
        info!("[Worker] Polling thread has exited.");
        Ok(())
      }
      Err(RecvTimeoutError::Timeout) => {
        error!("[Worker] Polling thread failed to exit within {:?}.", timeout);
        self.thread = Some(thread);
        Err(LiveDataError::StopTimeout(timeout))
      }
    }
  }
}

fn poll_loop(
  source: &dyn LiveDataSource,
  shared: &SharedGameData,
  stop: &StopFlag,
  internal: &StopFlag,
  interval: Duration,
) {
  let flags = [stop, internal];
  while !flags.iter().any(|f| f.is_raised()) {
    match source.fetch() {
      Ok(snapshot) => match shared.lock() {
        Ok(mut guard) => *guard = Some(snapshot),
        Err(_) => {
          error!("[Worker] Live game data lock poisoned, stopping poller");
          return;
        }
      },
      Err(e) => {
        debug!("[Worker] Game data request failed: {}", e);
        sleep_unless_raised(&flags, FETCH_FAILURE_BACKOFF);
        continue;
      }
    }
    sleep_unless_raised(&flags, interval);
  }
}
