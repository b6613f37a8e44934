// Import of the client's input settings into normalized key bindings

use serde_json::Value;
use std::collections::BTreeMap;

use super::types::Binding;

const INPUT_SECTIONS: [&str; 4] = ["GameEvents", "HUDEvents", "Quickbinds", "ShopEvents"];

/// Parse `/lol-game-settings/v1/input-settings` into event -> bindings.
///
/// Values look like `"[Shift][q],[Button 2]"`: comma separated bindings, each a
/// run of bracketed tokens. Unbound entries are dropped; non-string values map
/// to an empty binding list.
pub fn parse_input_settings(input: &Value) -> BTreeMap<String, Vec<Binding>> {
  let mut parsed = BTreeMap::new();

  for section in INPUT_SECTIONS {
    let Some(events) = input.get(section).and_then(|v| v.as_object()) else {
      continue;
    };
    for (event, value) in events {
      let bindings = match value.as_str() {
        Some(raw) => raw
          .split(',')
          .map(str::trim)
          .filter(|part| !part.is_empty())
          .filter_map(parse_single_binding)
          .collect(),
        None => Vec::new(),
      };
      parsed.insert(event.clone(), bindings);
    }
  }

  parsed
}

fn bracket_tokens(raw: &str) -> Vec<&str> {
  let mut tokens = Vec::new();
  let mut rest = raw;
  while let Some(start) = rest.find('[') {
    let after = &rest[start + 1..];
    match after.find(']') {
      Some(end) => {
        tokens.push(&after[..end]);
        rest = &after[end + 1..];
      }
      None => break,
    }
  }
  tokens
}

fn parse_single_binding(raw: &str) -> Option<Binding> {
  let tokens = bracket_tokens(raw);
  if tokens.is_empty()
    || tokens
      .iter()
      .any(|t| t.trim().eq_ignore_ascii_case("<unbound>"))
  {
    return None;
  }

  let mut modifiers = Vec::new();
  let mut key = None;
  let mut mouse = None;

  for token in tokens {
    let lower = token.trim().to_lowercase();
    if let Some(modifier) = normalize_modifier(&lower) {
      modifiers.push(modifier.to_string());
      continue;
    }
    if lower.starts_with("button") || lower.contains("mouse") {
      if let Some(button) = mouse_button(&lower) {
        mouse = Some(button.to_string());
        continue;
      }
    }
    key = Some(normalize_key_name(&lower));
  }

  let raw = raw.to_string();
  if let Some(mouse) = mouse {
    return Some(Binding::Mouse { mouse, modifiers, raw });
  }
  key.map(|key| Binding::Key { key, modifiers, raw })
}

fn normalize_modifier(token: &str) -> Option<&'static str> {
  match token {
    "shift" => Some("shift"),
    "ctrl" | "control" => Some("ctrl"),
    "alt" | "altgr" => Some("alt"),
    "win" | "windows" | "cmd" | "meta" => Some("win"),
    _ => None,
  }
}

fn mouse_button(token: &str) -> Option<&'static str> {
  let digits: String = token
    .trim_start_matches("button")
    .trim()
    .chars()
    .take_while(|c| c.is_ascii_digit())
    .collect();
  match digits.as_str() {
    "1" => return Some("left"),
    "2" => return Some("right"),
    "" => {}
    _ => return Some("middle"),
  }
  if token.contains("left") {
    Some("left")
  } else if token.contains("right") {
    Some("right")
  } else if token.contains("middle") {
    Some("middle")
  } else {
    None
  }
}

fn normalize_key_name(token: &str) -> String {
  match token {
    "return" | "enter" => "enter".to_string(),
    "down arrow" => "down".to_string(),
    "up arrow" => "up".to_string(),
    "left arrow" => "left".to_string(),
    "right arrow" => "right".to_string(),
    "escape" | "esc" => "esc".to_string(),
    "tilde" => "`".to_string(),
    other => other.replace(' ', "_"),
  }
}
