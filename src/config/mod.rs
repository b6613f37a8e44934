// Configuration store - config.json is re-read on every access so settings
// edited through the menu apply to the next orchestrator action.

mod keybinds;
mod types;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;

pub use keybinds::parse_input_settings;
pub use types::{AppConfig, Binding, GameMode, GameResolution, GeneralConfig, PreferredChampion, Timings};

pub const CONFIG_PATH_ENV: &str = "RIFTPILOT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[derive(Debug, Clone)]
pub struct ConfigStore {
  path: PathBuf,
}

impl ConfigStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Store at `$RIFTPILOT_CONFIG`, or `config/config.json` when unset.
  pub fn from_env() -> Self {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Self::new(path)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn load(&self) -> Result<AppConfig, ConfigError> {
    let raw = self.load_raw()?;
    Ok(serde_json::from_value(raw)?)
  }

  fn load_raw(&self) -> Result<Value, ConfigError> {
    if !self.path.exists() {
      return Err(ConfigError::Missing(self.path.clone()));
    }
    let data = fs::read_to_string(&self.path)?;
    Ok(serde_json::from_str(&data)?)
  }

  fn save_raw(&self, value: &Value) -> Result<(), ConfigError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, serde_json::to_string_pretty(value)?)?;
    Ok(())
  }

  /// Orchestrator timings, falling back to defaults when the file can't be read.
  pub fn timings(&self) -> Timings {
    match self.load() {
      Ok(config) => config.orchestrator,
      Err(e) => {
        debug!("[Config] Using default timings: {}", e);
        Timings::default()
      }
    }
  }

  pub fn selected_game_mode(&self) -> Result<GameMode, ConfigError> {
    self.load()?.general.game_mode()
  }

  pub fn set_selected_game_mode(&self, mode: GameMode) -> Result<(), ConfigError> {
    let mut raw = self.load_raw()?;
    ensure_object(&mut raw, "General")["selected_game_mode"] = Value::from(mode.as_str());
    self.save_raw(&raw)
  }

  /// Replace the `Keybinds` section, leaving every other key untouched.
  pub fn save_keybinds(
    &self,
    keybinds: &std::collections::BTreeMap<String, Vec<Binding>>,
  ) -> Result<(), ConfigError> {
    let mut raw = self.load_raw()?;
    if !raw.is_object() {
      raw = Value::Object(Default::default());
    }
    raw["Keybinds"] = serde_json::to_value(keybinds)?;
    self.save_raw(&raw)?;
    debug!("[Config] Saved {} key bindings to {}", keybinds.len(), self.path.display());
    Ok(())
  }
}

fn ensure_object<'a>(root: &'a mut Value, key: &str) -> &'a mut Value {
  if !root.is_object() {
    *root = Value::Object(Default::default());
  }
  let entry = &mut root[key];
  if !entry.is_object() {
    *entry = Value::Object(Default::default());
  }
  entry
}
