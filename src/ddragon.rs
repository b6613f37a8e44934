// Champion id -> display name, from Riot's Data Dragon

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info};

const VERSIONS_URL: &str = "https://ddragon.leagueoflegends.com/api/versions.json";
const DEFAULT_LOCALE: &str = "en_US";

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
  reqwest::Client::builder()
    .timeout(Duration::from_secs(10))
    .build()
    .unwrap_or_default()
});

static CHAMPIONS: OnceCell<HashMap<i64, String>> = OnceCell::const_new();

async fn fetch_json(url: &str) -> Result<Value, reqwest::Error> {
  HTTP.get(url).send().await?.error_for_status()?.json().await
}

async fn fetch_champion_data() -> Result<Value, reqwest::Error> {
  let versions = fetch_json(VERSIONS_URL).await?;
  let version = versions
    .as_array()
    .and_then(|v| v.first())
    .and_then(|v| v.as_str())
    .unwrap_or("latest")
    .to_string();
  let url = format!(
    "https://ddragon.leagueoflegends.com/cdn/{}/data/{}/champion.json",
    version, DEFAULT_LOCALE
  );
  fetch_json(&url).await
}

/// Build `{id: name}` from a `champion.json` document. Bad entries are skipped.
pub fn parse_champion_map(doc: &Value) -> HashMap<i64, String> {
  doc
    .get("data")
    .and_then(|d| d.as_object())
    .map(|champs| {
      champs
        .values()
        .filter_map(|champ| {
          let id = champ.get("key")?.as_str()?.parse::<i64>().ok()?;
          let name = champ.get("name")?.as_str()?;
          Some((id, name.to_string()))
        })
        .collect()
    })
    .unwrap_or_default()
}

/// Fetched once per process. A failed fetch leaves the catalog empty.
pub async fn champion_map() -> &'static HashMap<i64, String> {
  CHAMPIONS
    .get_or_init(|| async {
      match fetch_champion_data().await {
        Ok(doc) => {
          let map = parse_champion_map(&doc);
          info!("[DataDragon] Loaded {} champions", map.len());
          map
        }
        Err(e) => {
          error!("[DataDragon] Failed to fetch champion data: {}", e);
          HashMap::new()
        }
      }
    })
    .await
}

pub async fn champion_name(id: i64) -> Option<String> {
  champion_map().await.get(&id).cloned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_champion_map() {
    let doc = json!({
      "type": "champion",
      "data": {
        "Aatrox": {"key": "266", "name": "Aatrox"},
        "MonkeyKing": {"key": "62", "name": "Wukong"},
        "Broken": {"key": "not-a-number", "name": "Broken"},
        "Nameless": {"key": "1"}
      }
    });
    let map = parse_champion_map(&doc);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&62).map(String::as_str), Some("Wukong"));
    assert_eq!(map.get(&266).map(String::as_str), Some("Aatrox"));
  }

  #[test]
  fn test_parse_missing_data() {
    assert!(parse_champion_map(&json!({})).is_empty());
  }
}
