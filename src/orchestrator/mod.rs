// Orchestrator module - drives the client through the match lifecycle in
// response to gateway events.

mod champ_select;
mod dispatcher;
mod gate;
mod lifecycle;
mod machine;
mod phase;
mod session;
mod shutdown;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::lcu::{EventKind, LcuApi, SubscriptionRegistry, LCU_CHAMP_SELECT_SESSION, LCU_CURRENT_CHAMPION, LCU_GAMEFLOW_PHASE};
use crate::window::WindowControl;
use crate::worker::WorkerManager;

pub use champ_select::{
  ActionKind, ChampSelectAction, ChampSelectHandler, ChampSelectSession, GridChampion,
  BAN_PICK_PHASE, BRAVERY_CHAMPION_ID,
};
pub use dispatcher::Dispatcher;
pub use gate::PauseGate;
pub use lifecycle::{ConnectionLifecycle, CurrentChampionHandler};
pub use machine::PhaseMachine;
pub use phase::GameflowPhase;
pub use session::Session;
pub use shutdown::{ProcessExit, ShutdownCoordinator, StdProcessExit, EXIT_CLEAN, EXIT_FATAL};

/// Everything the handlers share.
pub struct Orchestrator {
  pub(crate) session: Arc<Session>,
  pub(crate) lcu: Arc<dyn LcuApi>,
  pub(crate) config: ConfigStore,
  pub(crate) workers: Arc<WorkerManager>,
  pub(crate) windows: Arc<dyn WindowControl>,
  pub(crate) shutdown: Arc<ShutdownCoordinator>,
}

impl Orchestrator {
  pub fn new(
    lcu: Arc<dyn LcuApi>,
    config: ConfigStore,
    workers: Arc<WorkerManager>,
    windows: Arc<dyn WindowControl>,
    exit: Arc<dyn ProcessExit>,
  ) -> Arc<Self> {
    let session = Arc::new(Session::new());
    let shutdown = Arc::new(ShutdownCoordinator::new(
      session.clone(),
      workers.clone(),
      config.clone(),
      exit,
    ));
    Arc::new(Self {
      session,
      lcu,
      config,
      workers,
      windows,
      shutdown,
    })
  }

  pub fn session(&self) -> Arc<Session> {
    self.session.clone()
  }

  pub fn shutdown_coordinator(&self) -> Arc<ShutdownCoordinator> {
    self.shutdown.clone()
  }

  /// Build the handlers and the dispatcher that feeds them.
  pub fn dispatcher(self: &Arc<Self>) -> Dispatcher {
    let machine = Arc::new(PhaseMachine::new(self.clone()));
    let champ_select = Arc::new(ChampSelectHandler::new(self.clone()));
    let lifecycle = Arc::new(ConnectionLifecycle::new(self.clone(), machine.clone()));

    let mut registry = SubscriptionRegistry::new();
    registry
      .register(LCU_GAMEFLOW_PHASE, &[EventKind::Update], machine)
      .register(
        LCU_CHAMP_SELECT_SESSION,
        &[EventKind::Create, EventKind::Update],
        champ_select,
      )
      .register(
        LCU_CURRENT_CHAMPION,
        &[EventKind::Create, EventKind::Update],
        Arc::new(CurrentChampionHandler),
      );

    Dispatcher::new(
      self.session.clone(),
      self.config.clone(),
      registry,
      lifecycle,
      self.shutdown.clone(),
    )
  }
}
