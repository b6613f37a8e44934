// Match worker - waits for the match to start, then ticks the configured tactics
// against live game data until the match ends or it is told to stop.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::live_data::{LiveClientApi, LiveDataPoller, LiveDataSource, LiveGameSnapshot, SharedGameData};
use super::tactics::Tactics;
use super::{StopFlag, Worker};
use crate::config::GameMode;
use crate::error::WorkerError;

const WAIT_FOR_START_INTERVAL: Duration = Duration::from_secs(1);
const TICK_INTERVAL: Duration = Duration::from_millis(250);
const POLLER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MatchWorker {
  mode: GameMode,
  tactics: Box<dyn Tactics>,
  source: Option<Arc<dyn LiveDataSource>>,
  poll_interval: Duration,
  tick_interval: Duration,
  start_interval: Duration,
}

impl MatchWorker {
  pub fn new(mode: GameMode, tactics: Box<dyn Tactics>, poll_interval: Duration) -> Self {
    Self {
      mode,
      tactics,
      source: None,
      poll_interval,
      tick_interval: TICK_INTERVAL,
      start_interval: WAIT_FOR_START_INTERVAL,
    }
  }

  /// Read live data from `source` instead of the game's local endpoint.
  pub fn with_source(mut self, source: Arc<dyn LiveDataSource>) -> Self {
    self.source = Some(source);
    self
  }

  pub fn with_intervals(mut self, tick: Duration, wait_for_start: Duration) -> Self {
    self.tick_interval = tick;
    self.start_interval = wait_for_start;
    self
  }
}

fn latest(shared: &SharedGameData) -> Option<LiveGameSnapshot> {
  shared.lock().ok().and_then(|guard| guard.clone())
}

fn format_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

impl Worker for MatchWorker {
  fn run(self: Box<Self>, stop: StopFlag) -> Result<(), WorkerError> {
    let MatchWorker {
      mode,
      mut tactics,
      source,
      poll_interval,
      tick_interval,
      start_interval,
    } = *self;

    let source: Arc<dyn LiveDataSource> = match source {
      Some(source) => source,
      None => Arc::new(LiveClientApi::new()?),
    };

    let shared = SharedGameData::default();
    let mut poller = LiveDataPoller::new(stop.clone());
    poller.start(source, shared.clone(), poll_interval)?;

    info!("[Worker] Waiting for {} match to start...", mode);
    let first = loop {
      if stop.is_raised() {
        info!("[Worker] Stop requested before the match started");
        poller.stop(POLLER_STOP_TIMEOUT)?;
        return Ok(());
      }
      if let Some(snapshot) = latest(&shared).filter(|s| s.is_game_started()) {
        break snapshot;
      }
      stop.sleep(start_interval);
    };

    info!("[Worker] Game loop has started.");
    let started = Instant::now();
    tactics.on_start(&first);

    loop {
      let snapshot = latest(&shared);
      if stop.is_raised() {
        info!("[Worker] Stop requested, leaving game loop");
        break;
      }
      match snapshot {
        Some(s) if s.is_game_ended() => break,
        Some(s) => tactics.tick(&s, &stop),
        None => warn!("[Worker] No live game data available"),
      }
      stop.sleep(tick_interval);
    }

    poller.stop(POLLER_STOP_TIMEOUT)?;
    info!("[Worker] Game loop has ended.");
    info!("[Worker] Match duration: {}", format_elapsed(started.elapsed()));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::worker::live_data::tests::{snapshot, ScriptedSource};
  use crate::worker::ObserverTactics;
  use std::sync::Mutex;

  struct CountingTactics(Arc<Mutex<u32>>);

  impl Tactics for CountingTactics {
    fn tick(&mut self, _snapshot: &LiveGameSnapshot, _stop: &StopFlag) {
      *self.0.lock().unwrap() += 1;
    }
  }

  fn fast(worker: MatchWorker) -> Box<MatchWorker> {
    Box::new(
      worker.with_intervals(Duration::from_millis(5), Duration::from_millis(5)),
    )
  }

  #[test]
  fn test_format_elapsed() {
    assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
    assert_eq!(format_elapsed(Duration::from_millis(999)), "00:00:00");
  }

  #[test]
  fn test_runs_until_game_end() {
    let ticks = Arc::new(Mutex::new(0));
    let mut script = vec![snapshot(1, &[])];
    script.extend((0..40).map(|i| snapshot(1 + i / 10, &["GameStart"])));
    script.push(snapshot(5, &["GameStart", "GameEnd"]));
    let source = Arc::new(ScriptedSource::new(script));
    let worker = MatchWorker::new(
      GameMode::Test,
      Box::new(CountingTactics(ticks.clone())),
      Duration::from_millis(5),
    )
    .with_source(source);

    fast(worker).run(StopFlag::new()).unwrap();
    assert!(*ticks.lock().unwrap() > 0);
  }

  #[test]
  fn test_stop_before_start_returns_promptly() {
    let source = Arc::new(ScriptedSource::new(vec![snapshot(1, &[])]));
    let worker = MatchWorker::new(
      GameMode::Arena,
      Box::new(ObserverTactics::default()),
      Duration::from_millis(5),
    )
    .with_source(source);

    let stop = StopFlag::new();
    let raiser = stop.clone();
    let t = std::thread::spawn(move || {
      std::thread::sleep(Duration::from_millis(30));
      raiser.raise();
    });
    let started = Instant::now();
    fast(worker).run(stop).unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    t.join().unwrap();
  }

  #[test]
  fn test_stop_mid_match_ends_loop() {
    let ticks = Arc::new(Mutex::new(0));
    let source = Arc::new(ScriptedSource::new(vec![snapshot(4, &["GameStart"])]));
    let worker = MatchWorker::new(
      GameMode::Aram,
      Box::new(CountingTactics(ticks.clone())),
      Duration::from_millis(5),
    )
    .with_source(source);

    let stop = StopFlag::new();
    let raiser = stop.clone();
    let counter = ticks.clone();
    let t = std::thread::spawn(move || {
      for _ in 0..400 {
        if *counter.lock().unwrap() > 0 {
          break;
        }
        std::thread::sleep(Duration::from_millis(5));
      }
      raiser.raise();
    });
    fast(worker).run(stop).unwrap();
    t.join().unwrap();
    assert!(*ticks.lock().unwrap() > 0);
  }
}
