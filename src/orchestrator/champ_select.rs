// Champion select - ban and pick for the local player while the draft is in BAN_PICK

use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Orchestrator;
use crate::error::{LcuError, OrchestratorError};
use crate::lcu::{champ_select_action_path, EventHandler, HandlerFuture, LcuEvent, LCU_ALL_GRID_CHAMPIONS};

pub const BAN_PICK_PHASE: &str = "BAN_PICK";

/// Server-side "random eligible champion" pick.
pub const BRAVERY_CHAMPION_ID: i64 = -3;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectSession {
  #[serde(default)]
  pub local_player_cell_id: i64,
  #[serde(default)]
  pub actions: Vec<Vec<ChampSelectAction>>,
  #[serde(default)]
  pub timer: ChampSelectTimer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChampSelectTimer {
  #[serde(default)]
  pub phase: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
  Ban,
  Pick,
  #[serde(other)]
  Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectAction {
  pub id: i64,
  pub actor_cell_id: i64,
  #[serde(rename = "type")]
  pub kind: ActionKind,
  #[serde(default)]
  pub is_in_progress: bool,
  #[serde(default)]
  pub completed: bool,
}

impl ChampSelectSession {
  pub fn is_ban_pick(&self) -> bool {
    self.timer.phase == BAN_PICK_PHASE
  }

  /// The local player's in-progress actions, in draft order.
  pub fn pending_actions(&self) -> Vec<ChampSelectAction> {
    self
      .actions
      .iter()
      .flatten()
      .filter(|a| a.actor_cell_id == self.local_player_cell_id && a.is_in_progress)
      .cloned()
      .collect()
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridChampion {
  pub id: i64,
  #[serde(default)]
  pub owned: bool,
  #[serde(default)]
  pub free_to_play: bool,
  #[serde(default)]
  pub selection_status: SelectionStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionStatus {
  #[serde(default)]
  pub picked_by_other_or_banned: bool,
}

impl GridChampion {
  fn available(&self) -> bool {
    self.owned || self.free_to_play
  }
}

/// Champions the player can ban: owned or free, not already taken.
pub fn ban_pool(grid: &[GridChampion]) -> Vec<i64> {
  grid
    .iter()
    .filter(|c| c.available() && !c.selection_status.picked_by_other_or_banned)
    .map(|c| c.id)
    .collect()
}

/// Champions the player can pick from: owned or free.
pub fn pick_pool(grid: &[GridChampion]) -> Vec<i64> {
  grid.iter().filter(|c| c.available()).map(|c| c.id).collect()
}

/// Pick attempts in priority order: preferred, bravery, then a random one.
pub fn pick_candidates(preferred: Option<i64>, random: Option<i64>) -> Vec<i64> {
  preferred
    .into_iter()
    .chain(std::iter::once(BRAVERY_CHAMPION_ID))
    .chain(random)
    .collect()
}

fn choose_random(ids: &[i64]) -> Option<i64> {
  ids.choose(&mut rand::thread_rng()).copied()
}

pub struct ChampSelectHandler {
  orch: Arc<Orchestrator>,
}

impl ChampSelectHandler {
  pub fn new(orch: Arc<Orchestrator>) -> Self {
    Self { orch }
  }

  async fn fetch_grid(&self) -> Result<Vec<GridChampion>, LcuError> {
    let raw = self.orch.lcu.get(LCU_ALL_GRID_CHAMPIONS).await?;
    serde_json::from_value(raw).map_err(|e| LcuError::Decode(e.to_string()))
  }

  async fn submit(&self, action_id: i64, champion_id: i64) -> Result<(), LcuError> {
    self
      .orch
      .lcu
      .patch(
        &champ_select_action_path(action_id),
        json!({ "championId": champion_id, "completed": true }),
      )
      .await
      .map(|_| ())
  }

  /// At most one ban and one pick per snapshot. Returns after the pick.
  pub async fn handle(&self, actions: Vec<ChampSelectAction>) {
    let mut banned = false;
    for action in actions {
      match action.kind {
        ActionKind::Ban if !banned => {
          banned = true;
          self.ban(action.id).await;
        }
        ActionKind::Pick => {
          self.pick(action.id).await;
          return;
        }
        _ => {}
      }
    }
  }

  async fn ban(&self, action_id: i64) {
    let grid = match self.fetch_grid().await {
      Ok(grid) => grid,
      Err(e) => {
        warn!("[ChampSelect] Could not load champion grid: {}", e);
        return;
      }
    };
    let Some(champion_id) = choose_random(&ban_pool(&grid)) else {
      warn!("[ChampSelect] No champion available to ban");
      return;
    };

    info!("[ChampSelect] Banning champion {}", champion_id);
    match self.submit(action_id, champion_id).await {
      Ok(()) => info!("[ChampSelect] Banned champion {}", champion_id),
      Err(e) => warn!("[ChampSelect] Ban of {} failed: {}", champion_id, e),
    }
    tokio::time::sleep(self.orch.config.timings().ban_settle()).await;
  }

  async fn pick(&self, action_id: i64) {
    let grid = match self.fetch_grid().await {
      Ok(grid) => grid,
      Err(e) => {
        warn!("[ChampSelect] Could not load champion grid: {}", e);
        return;
      }
    };
    let preferred = self
      .orch
      .config
      .load()
      .ok()
      .and_then(|c| c.general.preferred_champion_id());
    let candidates = pick_candidates(preferred, choose_random(&pick_pool(&grid)));

    for champion_id in candidates {
      match self.submit(action_id, champion_id).await {
        Ok(()) => {
          info!("[ChampSelect] Picked champion {}", champion_id);
          return;
        }
        Err(e) => debug!("[ChampSelect] Pick of {} rejected: {}", champion_id, e),
      }
    }
    warn!("[ChampSelect] Every pick candidate was rejected");
  }
}

impl EventHandler for ChampSelectHandler {
  fn name(&self) -> &'static str {
    "champ-select"
  }

  fn prepare(self: Arc<Self>, event: &LcuEvent) -> Option<HandlerFuture> {
    let session: ChampSelectSession = match serde_json::from_value(event.data.clone()) {
      Ok(session) => session,
      Err(e) => {
        debug!("[ChampSelect] Unreadable session snapshot: {}", e);
        return None;
      }
    };
    if !session.is_ban_pick() {
      return None;
    }
    let actions = session.pending_actions();
    if actions.is_empty() {
      return None;
    }
    Some(Box::pin(async move {
      self.handle(actions).await;
      Ok::<(), OrchestratorError>(())
    }))
  }
}
