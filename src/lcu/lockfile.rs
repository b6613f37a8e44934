// Lockfile discovery for the League client

use notify::{RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::types::LcuCredentials;

pub const LOCKFILE_NAMES: [&str; 3] = [
  "lockfile",
  "LeagueClientUx.lockfile",
  "LeagueClient.lockfile",
];

/// Parse `LeagueClient:<pid>:<port>:<password>:<protocol>`.
pub fn parse_lockfile(content: &str, path: &Path) -> Option<LcuCredentials> {
  let parts: Vec<&str> = content.trim().split(':').collect();
  if parts.len() < 5 {
    return None;
  }
  let port = parts[2].parse::<u16>().ok()?;
  Some(LcuCredentials {
    port,
    token: parts[3].to_string(),
    lockfile: path.to_path_buf(),
  })
}

/// First readable lockfile across `dirs`.
pub fn read_lockfile_once(dirs: &[PathBuf]) -> Option<LcuCredentials> {
  for dir in dirs {
    for name in LOCKFILE_NAMES {
      let path = dir.join(name);
      if let Ok(content) = fs::read_to_string(&path) {
        if let Some(creds) = parse_lockfile(&content, &path) {
          return Some(creds);
        }
      }
    }
  }
  None
}

/// Sleep until something changes in one of `dirs`, or `fallback` elapses.
///
/// The watcher only shortens the wait; callers re-read the lockfile either way.
pub async fn wait_for_lockfile_change(dirs: &[PathBuf], fallback: Duration) {
  let (tx, mut rx) = mpsc::unbounded_channel::<()>();
  let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
    if res.is_ok() {
      let _ = tx.send(());
    }
  });

  let mut watcher = match watcher {
    Ok(w) => w,
    Err(e) => {
      debug!("[Gateway] Lockfile watcher unavailable ({}), polling instead", e);
      tokio::time::sleep(fallback).await;
      return;
    }
  };

  let mut watching = 0;
  for dir in dirs.iter().filter(|d| d.is_dir()) {
    if watcher.watch(dir, RecursiveMode::NonRecursive).is_ok() {
      watching += 1;
    }
  }
  if watching == 0 {
    tokio::time::sleep(fallback).await;
    return;
  }

  let _ = tokio::time::timeout(fallback, rx.recv()).await;
}
