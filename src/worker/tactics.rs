use tracing::info;

use super::live_data::LiveGameSnapshot;
use super::StopFlag;

/// Per-tick decision logic plugged into the match loop. Implementations drive
/// input and must not block past the stop flag.
pub trait Tactics: Send {
  fn on_start(&mut self, _snapshot: &LiveGameSnapshot) {}

  fn tick(&mut self, snapshot: &LiveGameSnapshot, stop: &StopFlag);
}

/// Watches the match and logs what happens. Sends no input.
#[derive(Debug, Default)]
pub struct ObserverTactics {
  level: u32,
  dead: bool,
}

impl Tactics for ObserverTactics {
  fn on_start(&mut self, snapshot: &LiveGameSnapshot) {
    self.level = snapshot.active_player.level;
  }

  fn tick(&mut self, snapshot: &LiveGameSnapshot, _stop: &StopFlag) {
    let player = &snapshot.active_player;
    if player.level > self.level {
      info!("[Worker] Level up: {} -> {}", self.level, player.level);
      self.level = player.level;
    }

    let dead = player.champion_stats.max_health > 0.0 && player.champion_stats.current_health <= 0.0;
    if dead != self.dead {
      if dead {
        info!("[Worker] Champion died");
      } else {
        info!("[Worker] Champion respawned");
      }
      self.dead = dead;
    }
  }
}
