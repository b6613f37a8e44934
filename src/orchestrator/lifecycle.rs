// Connect/disconnect handling, plus the current-champion log line

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::machine::PhaseMachine;
use super::phase::GameflowPhase;
use super::Orchestrator;
use crate::config::parse_input_settings;
use crate::ddragon;
use crate::error::OrchestratorError;
use crate::lcu::{EventHandler, HandlerFuture, LcuEvent, LifecycleHandler, LCU_GAMEFLOW_PHASE, LCU_INPUT_SETTINGS};
use crate::window::{bring_to_front, CLIENT_WINDOW_TITLE};

pub struct ConnectionLifecycle {
  orch: Arc<Orchestrator>,
  machine: Arc<PhaseMachine>,
}

impl ConnectionLifecycle {
  pub fn new(orch: Arc<Orchestrator>, machine: Arc<PhaseMachine>) -> Self {
    Self { orch, machine }
  }

  async fn import_keybinds(&self) {
    let settings = match self.orch.lcu.get(LCU_INPUT_SETTINGS).await {
      Ok(settings) => settings,
      Err(e) => {
        debug!("[Config] Could not read client input settings: {}", e);
        return;
      }
    };
    let keybinds = parse_input_settings(&settings);
    if let Err(e) = self.orch.config.save_keybinds(&keybinds) {
      debug!("[Config] Could not save key bindings: {}", e);
    }
  }

  /// Focus the client, import key bindings, then act on whatever phase the
  /// client is already in.
  async fn sync_with_client(&self) -> Result<(), OrchestratorError> {
    info!("[Gateway] League client ready");
    let timings = self.orch.config.timings();
    bring_to_front(
      self.orch.windows.as_ref(),
      CLIENT_WINDOW_TITLE,
      timings.window_focus_timeout(),
    )
    .await;
    self.import_keybinds().await;

    let raw = match self.orch.lcu.get(LCU_GAMEFLOW_PHASE).await {
      Ok(raw) => raw,
      Err(e) => {
        warn!("[Phase] Could not read current phase: {}", e);
        return Ok(());
      }
    };
    let Some(phase) = GameflowPhase::from_value(&raw) else {
      warn!("[Phase] Current phase response was not a phase name");
      return Ok(());
    };

    info!("[Phase] Current phase on connect: {}", phase);
    if self.machine.observe(&phase) {
      self.machine.run_transition(phase).await?;
    }
    Ok(())
  }
}

impl LifecycleHandler for ConnectionLifecycle {
  fn on_ready(self: Arc<Self>) -> HandlerFuture {
    // Before anything else is dispatched, so a restarted client's phase is
    // never mistaken for a duplicate.
    self.orch.session.reset_phase();
    Box::pin(async move { self.sync_with_client().await })
  }

  fn on_close(self: Arc<Self>) -> HandlerFuture {
    Box::pin(async move {
      info!("[Gateway] League client disconnected");
      Ok::<(), OrchestratorError>(())
    })
  }
}

/// Logs the champion the local player currently has selected.
#[derive(Debug, Default)]
pub struct CurrentChampionHandler;

impl EventHandler for CurrentChampionHandler {
  fn name(&self) -> &'static str {
    "current-champion"
  }

  fn prepare(self: Arc<Self>, event: &LcuEvent) -> Option<HandlerFuture> {
    let id = event.data.as_i64().filter(|id| *id > 0)?;
    Some(Box::pin(async move {
      match ddragon::champion_name(id).await {
        Some(name) => info!("[ChampSelect] Current champion: {} ({})", name, id),
        None => info!("[ChampSelect] Current champion id: {}", id),
      }
      Ok::<(), OrchestratorError>(())
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lcu::EventKind;
  use serde_json::json;

  #[test]
  fn test_current_champion_ignores_empty_selection() {
    let handler = Arc::new(CurrentChampionHandler);
    let event = |data| LcuEvent {
      uri: crate::lcu::LCU_CURRENT_CHAMPION.to_string(),
      kind: EventKind::Update,
      data,
    };
    assert!(handler.clone().prepare(&event(json!(0))).is_none());
    assert!(handler.clone().prepare(&event(json!(null))).is_none());
    assert!(handler.prepare(&event(json!(222))).is_some());
  }
}
