// Topic -> handler registry, built once at startup

use futures_util::future::BoxFuture;
use std::sync::Arc;

use super::types::{EventKind, LcuEvent};
use crate::error::OrchestratorError;

/// The suspendable part of a handler. Only fatal errors are returned.
pub type HandlerFuture = BoxFuture<'static, Result<(), OrchestratorError>>;

/// Handler for one or more subscribed topics.
pub trait EventHandler: Send + Sync {
  fn name(&self) -> &'static str;

  /// Runs synchronously, in arrival order, on the event context. Returns the
  /// remainder of the work, or `None` if the event is ignored.
  fn prepare(self: Arc<Self>, event: &LcuEvent) -> Option<HandlerFuture>;
}

/// Connect/disconnect callbacks. `on_ready` may fire again after a client restart.
pub trait LifecycleHandler: Send + Sync {
  fn on_ready(self: Arc<Self>) -> HandlerFuture;
  fn on_close(self: Arc<Self>) -> HandlerFuture;
}

struct Subscription {
  topic: String,
  kinds: Vec<EventKind>,
  handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
  subscriptions: Vec<Subscription>,
}

impl SubscriptionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(
    &mut self,
    topic: &str,
    kinds: &[EventKind],
    handler: Arc<dyn EventHandler>,
  ) -> &mut Self {
    self.subscriptions.push(Subscription {
      topic: topic.to_string(),
      kinds: kinds.to_vec(),
      handler,
    });
    self
  }

  /// Distinct topics in registration order, for the gateway to subscribe to.
  pub fn topics(&self) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for sub in &self.subscriptions {
      if !topics.contains(&sub.topic) {
        topics.push(sub.topic.clone());
      }
    }
    topics
  }

  /// Handlers for `event`, in registration order.
  pub fn handlers_for<'a>(
    &'a self,
    event: &'a LcuEvent,
  ) -> impl Iterator<Item = Arc<dyn EventHandler>> + 'a {
    self
      .subscriptions
      .iter()
      .filter(move |s| s.topic == event.uri && s.kinds.contains(&event.kind))
      .map(|s| s.handler.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;

  struct Named(&'static str);

  impl EventHandler for Named {
    fn name(&self) -> &'static str {
      self.0
    }

    fn prepare(self: Arc<Self>, _event: &LcuEvent) -> Option<HandlerFuture> {
      None
    }
  }

  fn event(uri: &str, kind: EventKind) -> LcuEvent {
    LcuEvent {
      uri: uri.to_string(),
      kind,
      data: Value::Null,
    }
  }

  #[test]
  fn test_handlers_in_registration_order() {
    let mut registry = SubscriptionRegistry::new();
    registry
      .register("/a", &[EventKind::Update], Arc::new(Named("first")))
      .register("/b", &[EventKind::Create], Arc::new(Named("other")))
      .register(
        "/a",
        &[EventKind::Create, EventKind::Update],
        Arc::new(Named("second")),
      );

    let names: Vec<_> = registry
      .handlers_for(&event("/a", EventKind::Update))
      .map(|h| h.name())
      .collect();
    assert_eq!(names, vec!["first", "second"]);

    let names: Vec<_> = registry
      .handlers_for(&event("/a", EventKind::Create))
      .map(|h| h.name())
      .collect();
    assert_eq!(names, vec!["second"]);

    assert_eq!(registry.handlers_for(&event("/a", EventKind::Delete)).count(), 0);
    assert_eq!(registry.topics(), vec!["/a".to_string(), "/b".to_string()]);
  }
}
