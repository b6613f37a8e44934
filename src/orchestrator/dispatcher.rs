// Event dispatcher - the single consumer of gateway notifications

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::session::Session;
use super::shutdown::{ShutdownCoordinator, EXIT_FATAL};
use crate::config::ConfigStore;
use crate::lcu::{GatewayEvent, HandlerFuture, LifecycleHandler, SubscriptionRegistry};

pub struct Dispatcher {
  session: Arc<Session>,
  config: ConfigStore,
  registry: SubscriptionRegistry,
  lifecycle: Arc<dyn LifecycleHandler>,
  shutdown: Arc<ShutdownCoordinator>,
}

impl Dispatcher {
  pub fn new(
    session: Arc<Session>,
    config: ConfigStore,
    registry: SubscriptionRegistry,
    lifecycle: Arc<dyn LifecycleHandler>,
    shutdown: Arc<ShutdownCoordinator>,
  ) -> Self {
    Self {
      session,
      config,
      registry,
      lifecycle,
      shutdown,
    }
  }

  /// Topics the gateway should subscribe to.
  pub fn topics(&self) -> Vec<String> {
    self.registry.topics()
  }

  /// Handle notifications in arrival order until the gateway hangs up.
  ///
  /// Each one waits for the pause gate, then its handlers' synchronous part runs
  /// here and the rest is spawned on the current runtime.
  pub async fn run(self, mut events: mpsc::UnboundedReceiver<GatewayEvent>) {
    while let Some(event) = events.recv().await {
      if !self.wait_for_gate().await {
        return;
      }
      if self.session.is_shutdown_requested() {
        debug!("[Dispatch] Shutting down, dropping {:?}", event);
        continue;
      }

      match event {
        GatewayEvent::Ready => self.spawn("on-ready", self.lifecycle.clone().on_ready()),
        GatewayEvent::Closed => self.spawn("on-close", self.lifecycle.clone().on_close()),
        GatewayEvent::Json(event) => {
          for handler in self.registry.handlers_for(&event) {
            let name = handler.name();
            if let Some(work) = handler.prepare(&event) {
              self.spawn(name, work);
            }
          }
        }
      }
    }
    info!("[Dispatch] Event stream ended");
  }

  /// Wait until the gate is open. If shutdown is requested while it is closed
  /// and it stays closed past the ceiling, the process is forced down and
  /// false is returned.
  async fn wait_for_gate(&self) -> bool {
    let gate = self.session.gate();
    if gate.is_open() {
      return true;
    }
    debug!("[Dispatch] Pause gate closed, holding events");
    tokio::select! {
      _ = gate.await_open() => true,
      _ = self.session.shutdown_requested() => {
        let ceiling = self.config.timings().gate_ceiling();
        if gate.await_open_within(ceiling).await {
          true
        } else {
          error!("[Dispatch] Pause gate still closed {:?} after shutdown was requested", ceiling);
          self.shutdown.force_exit(EXIT_FATAL);
          false
        }
      }
    }
  }

  fn spawn(&self, name: &'static str, work: HandlerFuture) {
    let shutdown = self.shutdown.clone();
    tokio::spawn(async move {
      if let Err(e) = work.await {
        error!("[Dispatch] {} handler failed: {}", name, e);
        shutdown.shutdown(&e.to_string(), EXIT_FATAL).await;
      }
    });
  }
}
