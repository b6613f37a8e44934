// Top-level window lookup and focus for the client and game windows

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const CLIENT_WINDOW_TITLE: &str = "League of Legends";
pub const GAME_WINDOW_TITLE: &str = "League of Legends (TM) Client";

const FOCUS_RETRY_INTERVAL: Duration = Duration::from_millis(500);

pub trait WindowControl: Send + Sync {
  fn is_open(&self, title: &str) -> bool;

  /// Restore and foreground the window. Returns false if it was not found.
  fn focus(&self, title: &str) -> bool;
}

/// Native windows on Windows, a no-op elsewhere.
pub fn system_windows() -> Arc<dyn WindowControl> {
  #[cfg(windows)]
  {
    Arc::new(Win32Windows)
  }
  #[cfg(not(windows))]
  {
    Arc::new(NoopWindowControl)
  }
}

#[cfg(windows)]
pub struct Win32Windows;

#[cfg(windows)]
mod win32 {
  use windows::core::PCWSTR;
  use windows::Win32::Foundation::HWND;
  use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, SetForegroundWindow, ShowWindow, SW_RESTORE,
  };

  pub(super) fn find(title: &str) -> Option<HWND> {
    let wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
    let hwnd = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) };
    if hwnd.0 == 0 {
      None
    } else {
      Some(hwnd)
    }
  }

  pub(super) fn focus(hwnd: HWND) -> bool {
    unsafe {
      let _ = ShowWindow(hwnd, SW_RESTORE);
      SetForegroundWindow(hwnd).as_bool()
    }
  }
}

#[cfg(windows)]
impl WindowControl for Win32Windows {
  fn is_open(&self, title: &str) -> bool {
    win32::find(title).is_some()
  }

  fn focus(&self, title: &str) -> bool {
    match win32::find(title) {
      Some(hwnd) => win32::focus(hwnd),
      None => false,
    }
  }
}

#[derive(Debug, Default)]
pub struct NoopWindowControl;

impl WindowControl for NoopWindowControl {
  fn is_open(&self, _title: &str) -> bool {
    false
  }

  fn focus(&self, _title: &str) -> bool {
    false
  }
}

/// Keep trying to focus `title` until it works or `timeout` passes.
pub async fn bring_to_front(windows: &dyn WindowControl, title: &str, timeout: Duration) -> bool {
  let deadline = Instant::now() + timeout;
  loop {
    if windows.focus(title) {
      debug!("[Window] Focused '{}'", title);
      return true;
    }
    if Instant::now() + FOCUS_RETRY_INTERVAL > deadline {
      warn!("[Window] Could not focus '{}' within {:?}", title, timeout);
      return false;
    }
    tokio::time::sleep(FOCUS_RETRY_INTERVAL).await;
  }
}

/// Poll until `title` is gone. Returns false if it is still open at `ceiling`.
pub async fn wait_until_closed(
  windows: &dyn WindowControl,
  title: &str,
  ceiling: Duration,
  poll: Duration,
) -> bool {
  let deadline = Instant::now() + ceiling;
  while windows.is_open(title) {
    if Instant::now() >= deadline {
      return false;
    }
    tokio::time::sleep(poll).await;
  }
  info!("[Window] '{}' has closed", title);
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Open for the first `open_polls` checks, focusable after `focus_after` attempts.
  struct Scripted {
    open_polls: usize,
    focus_after: usize,
    polls: AtomicUsize,
    attempts: AtomicUsize,
  }

  impl WindowControl for Scripted {
    fn is_open(&self, _title: &str) -> bool {
      self.polls.fetch_add(1, Ordering::SeqCst) < self.open_polls
    }

    fn focus(&self, _title: &str) -> bool {
      self.attempts.fetch_add(1, Ordering::SeqCst) >= self.focus_after
    }
  }

  fn scripted(open_polls: usize, focus_after: usize) -> Scripted {
    Scripted {
      open_polls,
      focus_after,
      polls: AtomicUsize::new(0),
      attempts: AtomicUsize::new(0),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_wait_until_closed() {
    let w = scripted(3, 0);
    assert!(wait_until_closed(&w, GAME_WINDOW_TITLE, Duration::from_secs(60), Duration::from_secs(1)).await);
  }

  #[tokio::test(start_paused = true)]
  async fn test_wait_until_closed_hits_ceiling() {
    let w = scripted(usize::MAX, 0);
    assert!(!wait_until_closed(&w, GAME_WINDOW_TITLE, Duration::from_secs(5), Duration::from_secs(1)).await);
  }

  #[tokio::test(start_paused = true)]
  async fn test_bring_to_front_retries() {
    let w = scripted(0, 2);
    assert!(bring_to_front(&w, CLIENT_WINDOW_TITLE, Duration::from_secs(10)).await);
    assert_eq!(w.attempts.load(Ordering::SeqCst), 3);

    assert!(!bring_to_front(&NoopWindowControl, CLIENT_WINDOW_TITLE, Duration::from_secs(2)).await);
  }
}
