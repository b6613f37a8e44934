// Typed view over config.json

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
  #[serde(rename = "General", default)]
  pub general: GeneralConfig,
  #[serde(rename = "Keybinds", default, deserialize_with = "lenient_keybinds")]
  pub keybinds: BTreeMap<String, Vec<Binding>>,
  #[serde(rename = "Orchestrator", default)]
  pub orchestrator: Timings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
  #[serde(default)]
  pub selected_game_mode: Option<String>,
  #[serde(default)]
  pub preferred_champion: Option<PreferredChampion>,
  #[serde(default)]
  pub surrender: bool,
  #[serde(default)]
  pub game_resolution: Option<GameResolution>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub league_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferredChampion {
  pub id: Option<i64>,
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameResolution {
  pub width: u32,
  pub height: u32,
}

impl Default for GameResolution {
  fn default() -> Self {
    Self {
      width: 1920,
      height: 1080,
    }
  }
}

impl GeneralConfig {
  pub fn game_mode(&self) -> Result<GameMode, ConfigError> {
    let raw = self
      .selected_game_mode
      .as_deref()
      .ok_or_else(|| ConfigError::UnknownMode("<unset>".to_string()))?;
    raw.parse()
  }

  pub fn preferred_champion_id(&self) -> Option<i64> {
    self.preferred_champion.as_ref().and_then(|p| p.id)
  }

  /// Directories searched for the client lockfile, configured path first.
  pub fn install_dirs(&self) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(path) = self.league_path.as_deref().filter(|p| !p.is_empty()) {
      dirs.push(PathBuf::from(path));
    }
    dirs.extend(DEFAULT_INSTALL_DIRS.iter().map(PathBuf::from));
    dirs
  }
}

const DEFAULT_INSTALL_DIRS: [&str; 3] = [
  "C:\\Riot Games\\League of Legends",
  "C:\\Program Files\\Riot Games\\League of Legends",
  "C:\\Program Files (x86)\\Riot Games\\League of Legends",
];

/// Game modes the bot knows how to queue for and play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameMode {
  Arena,
  Aram,
  Test,
  YuumiSr,
}

impl GameMode {
  pub const ALL: [GameMode; 4] = [Self::Arena, Self::Aram, Self::Test, Self::YuumiSr];

  /// Matchmaking queue posted when creating the lobby.
  pub fn queue_id(self) -> i64 {
    match self {
      Self::Arena => 1700,
      Self::Aram => 450,
      Self::Test | Self::YuumiSr => -1,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Arena => "arena",
      Self::Aram => "aram",
      Self::Test => "test",
      Self::YuumiSr => "yuumi_sr",
    }
  }
}

impl fmt::Display for GameMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for GameMode {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|mode| mode.as_str() == wanted)
      .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Binding {
  Key {
    key: String,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default)]
    raw: String,
  },
  Mouse {
    mouse: String,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default)]
    raw: String,
  },
}

impl Binding {
  /// A bare key name, as older configs stored bindings.
  fn bare_key(key: &str) -> Self {
    Binding::Key {
      key: key.trim().to_lowercase(),
      modifiers: Vec::new(),
      raw: key.to_string(),
    }
  }
}

/// Bad entries are skipped so they can't take the rest of the config down.
fn lenient_keybinds<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Binding>>, D::Error>
where
  D: Deserializer<'de>,
{
  let Value::Object(entries) = Value::deserialize(deserializer)? else {
    warn!("[Config] Keybinds section is not an object, ignoring it");
    return Ok(BTreeMap::new());
  };

  let mut keybinds = BTreeMap::new();
  for (event, value) in entries {
    let bindings = match value {
      Value::String(key) if key.trim().is_empty() => Vec::new(),
      Value::String(key) => vec![Binding::bare_key(&key)],
      other => match serde_json::from_value::<Vec<Binding>>(other) {
        Ok(bindings) => bindings,
        Err(e) => {
          warn!("[Config] Skipping key binding '{}': {}", event, e);
          continue;
        }
      },
    };
    keybinds.insert(event, bindings);
  }
  Ok(keybinds)
}

/// Timeouts and delays used by the orchestrator, in milliseconds on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
  pub settle_delay_ms: u64,
  pub worker_exit_timeout_ms: u64,
  pub window_close_ceiling_ms: u64,
  pub window_poll_interval_ms: u64,
  pub window_focus_timeout_ms: u64,
  pub gateway_close_timeout_ms: u64,
  pub shutdown_worker_timeout_ms: u64,
  pub gate_ceiling_ms: u64,
  pub ban_settle_ms: u64,
  pub live_data_poll_ms: u64,
}

impl Default for Timings {
  fn default() -> Self {
    Self {
      settle_delay_ms: 1_000,
      worker_exit_timeout_ms: 60_000,
      window_close_ceiling_ms: 60_000,
      window_poll_interval_ms: 1_000,
      window_focus_timeout_ms: 60_000,
      gateway_close_timeout_ms: 10_000,
      shutdown_worker_timeout_ms: 5_000,
      gate_ceiling_ms: 30_000,
      ban_settle_ms: 500,
      live_data_poll_ms: 100,
    }
  }
}

impl Timings {
  pub fn settle_delay(&self) -> Duration {
    Duration::from_millis(self.settle_delay_ms)
  }

  pub fn worker_exit_timeout(&self) -> Duration {
    Duration::from_millis(self.worker_exit_timeout_ms)
  }

  pub fn window_close_ceiling(&self) -> Duration {
    Duration::from_millis(self.window_close_ceiling_ms)
  }

  pub fn window_poll_interval(&self) -> Duration {
    Duration::from_millis(self.window_poll_interval_ms)
  }

  pub fn window_focus_timeout(&self) -> Duration {
    Duration::from_millis(self.window_focus_timeout_ms)
  }

  pub fn gateway_close_timeout(&self) -> Duration {
    Duration::from_millis(self.gateway_close_timeout_ms)
  }

  pub fn shutdown_worker_timeout(&self) -> Duration {
    Duration::from_millis(self.shutdown_worker_timeout_ms)
  }

  pub fn gate_ceiling(&self) -> Duration {
    Duration::from_millis(self.gate_ceiling_ms)
  }

  pub fn ban_settle(&self) -> Duration {
    Duration::from_millis(self.ban_settle_ms)
  }

  pub fn live_data_poll(&self) -> Duration {
    Duration::from_millis(self.live_data_poll_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_game_mode_parse_is_case_insensitive() {
    assert_eq!("ARAM".parse::<GameMode>().unwrap(), GameMode::Aram);
    assert_eq!(" yuumi_sr ".parse::<GameMode>().unwrap(), GameMode::YuumiSr);
    assert!(matches!(
      "urf".parse::<GameMode>(),
      Err(ConfigError::UnknownMode(_))
    ));
  }

  #[test]
  fn test_queue_ids() {
    assert_eq!(GameMode::Arena.queue_id(), 1700);
    assert_eq!(GameMode::Aram.queue_id(), 450);
    assert_eq!(GameMode::Test.queue_id(), -1);
  }

  #[test]
  fn test_general_section_parses() {
    let json = r#"{
      "General": {
        "selected_game_mode": "Arena",
        "preferred_champion": {"id": 22, "name": "Ashe"},
        "surrender": true
      },
      "Keybinds": {
        "evtCastSpell1": [{"type": "key", "key": "q", "modifiers": [], "raw": "[q]"}]
      }
    }"#;
    let cfg: AppConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.general.game_mode().unwrap(), GameMode::Arena);
    assert_eq!(cfg.general.preferred_champion_id(), Some(22));
    assert!(cfg.general.surrender);
    assert_eq!(cfg.orchestrator, Timings::default());
    assert_eq!(cfg.keybinds["evtCastSpell1"].len(), 1);
  }

  /// Shape written by the settings menu: resolution object, an empty
  /// preferred champion, flat legacy bindings next to imported ones.
  #[test]
  fn test_menu_written_config_parses() {
    let json = r#"{
      "General": {
        "selected_game_mode": "aram",
        "preferred_champion": {},
        "surrender": false,
        "game_resolution": {"width": 2560, "height": 1440}
      },
      "Keybinds": {
        "center_camera": "Space",
        "evtCastSpell1": [{"type": "key", "key": "q", "modifiers": [], "raw": "[q]"}],
        "evtBroken": {"oops": true},
        "evtAlsoBroken": [{"type": "joystick"}]
      }
    }"#;
    let cfg: AppConfig = serde_json::from_str(json).unwrap();

    assert_eq!(cfg.general.game_mode().unwrap(), GameMode::Aram);
    assert_eq!(
      cfg.general.game_resolution,
      Some(GameResolution { width: 2560, height: 1440 })
    );
    assert_eq!(cfg.general.preferred_champion_id(), None);
    assert_eq!(
      cfg.keybinds["center_camera"],
      vec![Binding::Key {
        key: "space".into(),
        modifiers: vec![],
        raw: "Space".into(),
      }]
    );
    assert_eq!(cfg.keybinds["evtCastSpell1"].len(), 1);
    assert!(!cfg.keybinds.contains_key("evtBroken"));
    assert!(!cfg.keybinds.contains_key("evtAlsoBroken"));
  }

  #[test]
  fn test_partial_resolution_uses_defaults() {
    let cfg: AppConfig =
      serde_json::from_str(r#"{"General": {"game_resolution": {"width": 1280}}, "Keybinds": null}"#)
        .unwrap();
    assert_eq!(
      cfg.general.game_resolution,
      Some(GameResolution { width: 1280, height: 1080 })
    );
    assert!(cfg.keybinds.is_empty());
  }

  #[test]
  fn test_install_dirs_prefer_configured_path() {
    let general = GeneralConfig {
      league_path: Some("D:\\Games\\League".to_string()),
      ..Default::default()
    };
    let dirs = general.install_dirs();
    assert_eq!(dirs[0], PathBuf::from("D:\\Games\\League"));
    assert_eq!(dirs.len(), 4);
  }
}
