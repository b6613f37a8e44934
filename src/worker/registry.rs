use std::collections::HashMap;
use std::sync::Arc;

use super::match_loop::MatchWorker;
use super::tactics::ObserverTactics;
use super::Worker;
use crate::config::{AppConfig, GameMode};

/// Builds a fresh worker for one match from the current config.
pub trait WorkerFactory: Send + Sync {
  fn create(&self, config: &AppConfig) -> Box<dyn Worker>;
}

impl<F> WorkerFactory for F
where
  F: Fn(&AppConfig) -> Box<dyn Worker> + Send + Sync,
{
  fn create(&self, config: &AppConfig) -> Box<dyn Worker> {
    self(config)
  }
}

/// Game mode -> worker factory. Built once at startup.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
  factories: HashMap<GameMode, Arc<dyn WorkerFactory>>,
}

impl WorkerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every known mode mapped to the match loop with the observing tactics.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    for mode in GameMode::ALL {
      registry.register(
        mode,
        Arc::new(move |config: &AppConfig| -> Box<dyn Worker> {
          Box::new(MatchWorker::new(
            mode,
            Box::new(ObserverTactics::default()),
            config.orchestrator.live_data_poll(),
          ))
        }),
      );
    }
    registry
  }

  pub fn register(&mut self, mode: GameMode, factory: Arc<dyn WorkerFactory>) -> &mut Self {
    self.factories.insert(mode, factory);
    self
  }

  pub fn get(&self, mode: GameMode) -> Option<Arc<dyn WorkerFactory>> {
    self.factories.get(&mode).cloned()
  }
}
