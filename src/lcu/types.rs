// Types and constants for the League client control plane

use base64::{engine::general_purpose, Engine};
use serde_json::Value;
use std::path::PathBuf;

pub const LCU_GAMEFLOW_PHASE: &str = "/lol-gameflow/v1/gameflow-phase";
pub const LCU_LOBBY: &str = "/lol-lobby/v2/lobby";
pub const LCU_MATCHMAKING_SEARCH: &str = "/lol-lobby/v2/lobby/matchmaking/search";
pub const LCU_READY_CHECK_ACCEPT: &str = "/lol-matchmaking/v1/ready-check/accept";
pub const LCU_PLAY_AGAIN: &str = "/lol-lobby/v2/play-again";
pub const LCU_CHAMP_SELECT_SESSION: &str = "/lol-champ-select/v1/session";
pub const LCU_CURRENT_CHAMPION: &str = "/lol-champ-select/v1/current-champion";
pub const LCU_ALL_GRID_CHAMPIONS: &str = "/lol-champ-select/v1/all-grid-champions";
pub const LCU_INPUT_SETTINGS: &str = "/lol-game-settings/v1/input-settings";

pub fn champ_select_action_path(action_id: i64) -> String {
  format!("{}/actions/{}", LCU_CHAMP_SELECT_SESSION, action_id)
}

/// Port and password read from the client's lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcuCredentials {
  pub port: u16,
  pub token: String,
  pub lockfile: PathBuf,
}

impl LcuCredentials {
  pub fn auth_header(&self) -> String {
    format!(
      "Basic {}",
      general_purpose::STANDARD.encode(format!("riot:{}", self.token))
    )
  }

  pub fn rest_base(&self) -> String {
    format!("https://127.0.0.1:{}", self.port)
  }

  pub fn ws_url(&self) -> String {
    format!("wss://127.0.0.1:{}/", self.port)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Create,
  Update,
  Delete,
}

impl EventKind {
  pub fn from_wire(raw: &str) -> Option<Self> {
    match raw {
      "Create" | "CREATE" => Some(Self::Create),
      "Update" | "UPDATE" => Some(Self::Update),
      "Delete" | "DELETE" => Some(Self::Delete),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct LcuEvent {
  pub uri: String,
  pub kind: EventKind,
  pub data: Value,
}

/// Everything the gateway reports to the event context, in arrival order.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
  Ready,
  Closed,
  Json(LcuEvent),
}

/// WAMP topic the client publishes changes of `path` under.
pub fn topic_event_name(path: &str) -> String {
  format!("OnJsonApiEvent{}", path.replace('/', "_"))
}

/// Parse a WAMP event frame: `[8, "OnJsonApiEvent...", { uri, eventType, data }]`.
pub fn parse_event_frame(text: &str) -> Option<LcuEvent> {
  let val: Value = serde_json::from_str(text).ok()?;
  let arr = val.as_array()?;
  if arr.len() < 3 || arr[0].as_i64() != Some(8) {
    return None;
  }
  let obj = arr[2].as_object()?;
  let uri = obj.get("uri")?.as_str()?.to_string();
  let kind = EventKind::from_wire(obj.get("eventType")?.as_str()?)?;
  let data = obj.get("data").cloned().unwrap_or(Value::Null);
  Some(LcuEvent { uri, kind, data })
}
