// Log setup: stdout plus one timestamped file per run

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_FILTER: &str = "riftpilot=info,riftpilot_lib=info";

/// `logs/2024-05-01_18-30.log` style path for a run starting now.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
  let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M");
  log_dir.join(format!("{}.log", stamp))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Returns the log file path when file logging could be set up.
pub fn init_logging(log_dir: &Path) -> Option<PathBuf> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  let path = log_file_path(log_dir);
  let file = fs::create_dir_all(log_dir).and_then(|_| File::create(&path));
  let (file_layer, file_error) = match file {
    Ok(file) => (
      Some(
        fmt::layer()
          .with_ansi(false)
          .with_target(false)
          .with_writer(Mutex::new(file)),
      ),
      None,
    ),
    Err(e) => (None, Some(e)),
  };

  let installed = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(false))
    .with(file_layer)
    .try_init()
    .is_ok();

  if let Some(e) = file_error {
    warn!("[Logging] Could not open log file {}: {}", path.display(), e);
    return None;
  }
  installed.then_some(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_log_file_path_shape() {
    let path = log_file_path(Path::new("logs"));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with(".log"));
    // YYYY-MM-DD_HH-MM.log
    assert_eq!(name.len(), "2024-05-01_18-30.log".len());
    assert_eq!(path.parent().unwrap(), Path::new("logs"));
  }
}
