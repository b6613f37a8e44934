// LCU module - control-plane connection to the League client

mod client;
mod gateway;
mod lockfile;
mod subscriptions;
mod types;

pub use client::{LcuApi, LcuClient};
pub use gateway::{GatewayControl, GatewayHandle, LcuGateway};
pub use lockfile::{parse_lockfile, read_lockfile_once, LOCKFILE_NAMES};
pub use subscriptions::{EventHandler, HandlerFuture, LifecycleHandler, SubscriptionRegistry};
pub use types::*;
