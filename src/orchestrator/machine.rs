// Phase state machine - one action per distinct gameflow phase

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::phase::GameflowPhase;
use super::shutdown::EXIT_CLEAN;
use super::Orchestrator;
use crate::config::Timings;
use crate::error::{OrchestratorError, WorkerError};
use crate::lcu::{
  EventHandler, HandlerFuture, LcuEvent, LCU_LOBBY, LCU_MATCHMAKING_SEARCH, LCU_PLAY_AGAIN,
  LCU_READY_CHECK_ACCEPT,
};
use crate::window::{bring_to_front, wait_until_closed, GAME_WINDOW_TITLE};

pub struct PhaseMachine {
  orch: Arc<Orchestrator>,
}

impl PhaseMachine {
  pub fn new(orch: Arc<Orchestrator>) -> Self {
    Self { orch }
  }

  /// De-duplication step. True when `phase` is new and should be acted on.
  pub fn observe(&self, phase: &GameflowPhase) -> bool {
    self.orch.session.observe_phase(phase)
  }

  /// Run the action for `phase` after the settle delay. Only lifecycle
  /// violations are returned; API failures are logged.
  pub async fn run_transition(&self, phase: GameflowPhase) -> Result<(), OrchestratorError> {
    let timings = self.orch.config.timings();
    tokio::time::sleep(timings.settle_delay()).await;
    if self.orch.session.is_shutdown_requested() {
      debug!("[Phase] Shutdown in progress, skipping {}", phase);
      return Ok(());
    }

    match phase {
      GameflowPhase::None => self.create_lobby().await,
      GameflowPhase::Lobby => self.start_queue().await,
      GameflowPhase::ReadyCheck => self.accept_ready_check().await,
      GameflowPhase::InProgress => self.start_worker(&timings).await?,
      GameflowPhase::PreEndOfGame => self.finish_game(&timings).await?,
      other => debug!("[Phase] No action for {}", other),
    }
    Ok(())
  }

  async fn create_lobby(&self) {
    let mode = match self.orch.config.selected_game_mode() {
      Ok(mode) => mode,
      Err(e) => {
        error!("[Phase] Cannot create lobby: {}", e);
        return;
      }
    };
    info!("[Phase] Creating {} lobby (queue {})", mode, mode.queue_id());
    if let Err(e) = self
      .orch
      .lcu
      .post(LCU_LOBBY, Some(json!({ "queueId": mode.queue_id() })))
      .await
    {
      warn!("[Phase] Failed to create lobby: {}", e);
    }
  }

  async fn start_queue(&self) {
    info!("[Phase] Starting matchmaking");
    if let Err(e) = self.orch.lcu.post(LCU_MATCHMAKING_SEARCH, None).await {
      warn!("[Phase] Failed to start matchmaking: {}", e);
    }
  }

  async fn accept_ready_check(&self) {
    info!("[Phase] Accepting ready check");
    if let Err(e) = self.orch.lcu.post(LCU_READY_CHECK_ACCEPT, None).await {
      warn!("[Phase] Failed to accept ready check: {}", e);
    }
  }

  async fn start_worker(&self, timings: &Timings) -> Result<(), OrchestratorError> {
    bring_to_front(
      self.orch.windows.as_ref(),
      GAME_WINDOW_TITLE,
      timings.window_focus_timeout(),
    )
    .await;

    match self.orch.workers.start() {
      Ok(id) => info!("[Phase] Match worker {} started", id),
      Err(WorkerError::AlreadyRunning) => {
        error!("[Phase] Match already has a live worker");
        return Err(WorkerError::AlreadyRunning.into());
      }
      Err(e) => error!("[Phase] Could not start match worker: {}", e),
    }
    Ok(())
  }

  async fn finish_game(&self, timings: &Timings) -> Result<(), OrchestratorError> {
    let gate = self.orch.session.gate();
    gate.close();
    info!("[Phase] Match over, stopping worker");

    self.orch.workers.request_stop();
    self
      .orch
      .workers
      .await_completion(timings.worker_exit_timeout())
      .await?;

    info!("[Phase] Waiting for the game window to close");
    let closed = wait_until_closed(
      self.orch.windows.as_ref(),
      GAME_WINDOW_TITLE,
      timings.window_close_ceiling(),
      timings.window_poll_interval(),
    )
    .await;
    if !closed {
      error!(
        "[Phase] Game window still open after {:?}",
        timings.window_close_ceiling()
      );
      self
        .orch
        .shutdown
        .shutdown("game window did not close", EXIT_CLEAN)
        .await;
      return Ok(());
    }

    gate.open();
    info!("[Phase] Requesting play again");
    if let Err(e) = self.orch.lcu.post(LCU_PLAY_AGAIN, None).await {
      warn!("[Phase] Failed to request play again: {}", e);
    }
    Ok(())
  }
}

impl EventHandler for PhaseMachine {
  fn name(&self) -> &'static str {
    "gameflow-phase"
  }

  fn prepare(self: Arc<Self>, event: &LcuEvent) -> Option<HandlerFuture> {
    let phase = GameflowPhase::from_value(&event.data)?;
    if !self.observe(&phase) {
      debug!("[Phase] Duplicate {} notification ignored", phase);
      return None;
    }
    info!("[Phase] Gameflow phase changed to {}", phase);
    Some(Box::pin(async move { self.run_transition(phase).await }))
  }
}
