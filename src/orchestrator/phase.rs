use serde_json::Value;
use std::fmt;

/// The client's gameflow phase. Phases the orchestrator has no action for are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameflowPhase {
  None,
  Lobby,
  ReadyCheck,
  ChampionSelect,
  GameStart,
  InProgress,
  PreEndOfGame,
  EndOfGame,
  Other(String),
}

impl GameflowPhase {
  pub fn from_wire(raw: &str) -> Self {
    match raw {
      "None" => Self::None,
      "Lobby" => Self::Lobby,
      "ReadyCheck" => Self::ReadyCheck,
      "ChampSelect" | "ChampionSelect" => Self::ChampionSelect,
      "GameStart" => Self::GameStart,
      "InProgress" => Self::InProgress,
      "PreEndOfGame" => Self::PreEndOfGame,
      "EndOfGame" => Self::EndOfGame,
      other => Self::Other(other.to_string()),
    }
  }

  /// Phase carried by a gameflow-phase event or GET response (a bare JSON string).
  pub fn from_value(value: &Value) -> Option<Self> {
    value.as_str().map(Self::from_wire)
  }

  pub fn as_wire(&self) -> &str {
    match self {
      Self::None => "None",
      Self::Lobby => "Lobby",
      Self::ReadyCheck => "ReadyCheck",
      Self::ChampionSelect => "ChampSelect",
      Self::GameStart => "GameStart",
      Self::InProgress => "InProgress",
      Self::PreEndOfGame => "PreEndOfGame",
      Self::EndOfGame => "EndOfGame",
      Self::Other(raw) => raw,
    }
  }
}

impl fmt::Display for GameflowPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_wire())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_wire_names() {
    assert_eq!(GameflowPhase::from_wire("ChampSelect"), GameflowPhase::ChampionSelect);
    assert_eq!(GameflowPhase::from_wire("ChampionSelect"), GameflowPhase::ChampionSelect);
    assert_eq!(GameflowPhase::from_wire("PreEndOfGame"), GameflowPhase::PreEndOfGame);
    assert_eq!(
      GameflowPhase::from_wire("Matchmaking"),
      GameflowPhase::Other("Matchmaking".into())
    );
    assert_eq!(GameflowPhase::InProgress.to_string(), "InProgress");
  }

  #[test]
  fn test_from_value() {
    assert_eq!(GameflowPhase::from_value(&json!("Lobby")), Some(GameflowPhase::Lobby));
    assert_eq!(GameflowPhase::from_value(&json!(null)), None);
    assert_eq!(GameflowPhase::from_value(&json!({"phase": "Lobby"})), None);
  }
}
