// Connection gateway - owns the single WebSocket connection to the League client,
// reconnecting whenever the client restarts.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use native_tls::TlsConnector;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::LcuClient;
use super::lockfile::{read_lockfile_once, wait_for_lockfile_change};
use super::types::{parse_event_frame, topic_event_name, GatewayEvent, LcuCredentials};
use crate::error::LcuError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const LOCKFILE_FALLBACK_POLL: Duration = Duration::from_secs(3);
const LOCKFILE_CHECK_INTERVAL: Duration = Duration::from_secs(2);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Closing side of the gateway, used by the shutdown coordinator.
#[async_trait]
pub trait GatewayControl: Send + Sync {
  /// Ask the connection to close. Returns whether it confirmed within `timeout`.
  async fn close(&self, timeout: Duration) -> bool;
}

pub struct GatewayHandle {
  cancel: CancellationToken,
  task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl GatewayControl for GatewayHandle {
  async fn close(&self, timeout: Duration) -> bool {
    self.cancel.cancel();
    let task = self.task.lock().await.take();
    match task {
      Some(handle) => tokio::time::timeout(timeout, handle).await.is_ok(),
      None => true,
    }
  }
}

pub struct LcuGateway {
  client: LcuClient,
  install_dirs: Vec<PathBuf>,
  topics: Vec<String>,
  events: mpsc::UnboundedSender<GatewayEvent>,
  cancel: CancellationToken,
}

impl LcuGateway {
  /// Spawn the connection loop. Never fails when the client is absent; `Ready`
  /// is reported once it shows up, and again after every client restart.
  pub fn start(
    client: LcuClient,
    install_dirs: Vec<PathBuf>,
    topics: Vec<String>,
  ) -> (GatewayHandle, mpsc::UnboundedReceiver<GatewayEvent>) {
    let (events, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let gateway = LcuGateway {
      client,
      install_dirs,
      topics,
      events,
      cancel: cancel.clone(),
    };
    let task = tokio::spawn(gateway.run());
    let handle = GatewayHandle {
      cancel,
      task: Mutex::new(Some(task)),
    };
    (handle, rx)
  }

  async fn run(self) {
    info!("[Gateway] Waiting for league client...");

    loop {
      if self.cancel.is_cancelled() {
        break;
      }

      let Some(creds) = read_lockfile_once(&self.install_dirs) else {
        debug!("[Gateway] No valid lockfile found. Is League running?");
        tokio::select! {
          _ = self.cancel.cancelled() => break,
          _ = wait_for_lockfile_change(&self.install_dirs, LOCKFILE_FALLBACK_POLL) => {}
        }
        continue;
      };

      let connected = tokio::select! {
        _ = self.cancel.cancelled() => break,
        res = connect(&creds) => res,
      };
      let mut socket = match connected {
        Ok(socket) => socket,
        Err(e) => {
          warn!("[Gateway] WebSocket connect failed: {}", e);
          if self.sleep_or_cancel(RECONNECT_DELAY).await {
            break;
          }
          continue;
        }
      };

      if let Err(e) = self.subscribe(&mut socket).await {
        warn!("[Gateway] Subscribing to client events failed: {}", e);
        let _ = socket.close(None).await;
        if self.sleep_or_cancel(RECONNECT_DELAY).await {
          break;
        }
        continue;
      }

      self.client.set_credentials(creds.clone());
      info!("[Gateway] Connected to league client on port {}", creds.port);
      let _ = self.events.send(GatewayEvent::Ready);

      let closed_by_us = self.pump(&mut socket, &creds).await;

      self.client.clear_credentials();
      let _ = self.events.send(GatewayEvent::Closed);
      if closed_by_us || self.sleep_or_cancel(RECONNECT_DELAY).await {
        break;
      }
    }

    info!("[Gateway] Connection loop exited");
  }

  async fn subscribe(&self, socket: &mut WsStream) -> Result<(), LcuError> {
    for topic in &self.topics {
      let frame = serde_json::json!([5, topic_event_name(topic)]).to_string();
      socket
        .send(Message::Text(frame))
        .await
        .map_err(|e| LcuError::Unreachable(e.to_string()))?;
    }
    Ok(())
  }

  /// Forward subscribed events until the socket ends, the lockfile disappears,
  /// or close is requested. Returns true only in the last case.
  async fn pump(&self, socket: &mut WsStream, creds: &LcuCredentials) -> bool {
    let mut lockfile_check = tokio::time::interval(LOCKFILE_CHECK_INTERVAL);

    loop {
      tokio::select! {
        _ = self.cancel.cancelled() => {
          let _ = socket.close(None).await;
          return true;
        }
        _ = lockfile_check.tick() => {
          if !creds.lockfile.exists() {
            info!("[Gateway] Lockfile removed, league client has been closed");
            return false;
          }
        }
        msg = socket.next() => match msg {
          Some(Ok(Message::Text(text))) => {
            if let Some(evt) = parse_event_frame(&text) {
              if self.topics.iter().any(|t| *t == evt.uri) {
                let _ = self.events.send(GatewayEvent::Json(evt));
              }
            }
          }
          Some(Ok(Message::Close(_))) | None => {
            warn!("[Gateway] WebSocket stream ended");
            return false;
          }
          Some(Ok(_)) => {}
          Some(Err(e)) => {
            warn!("[Gateway] WebSocket read error: {}", e);
            return false;
          }
        }
      }
    }
  }

  /// Returns true if cancelled while sleeping.
  async fn sleep_or_cancel(&self, delay: Duration) -> bool {
    tokio::select! {
      _ = self.cancel.cancelled() => true,
      _ = tokio::time::sleep(delay) => false,
    }
  }
}

async fn connect(creds: &LcuCredentials) -> Result<WsStream, LcuError> {
  let tls = TlsConnector::builder()
    .danger_accept_invalid_certs(true)
    .build()
    .map_err(|e| LcuError::Unreachable(format!("failed to build TLS connector: {}", e)))?;

  let mut request = creds
    .ws_url()
    .into_client_request()
    .map_err(|e| LcuError::Unreachable(e.to_string()))?;
  let headers = request.headers_mut();
  headers.insert(
    "Authorization",
    creds
      .auth_header()
      .parse()
      .map_err(|_| LcuError::Unreachable("invalid auth header".to_string()))?,
  );
  headers.insert(
    "Sec-WebSocket-Protocol",
    "wamp"
      .parse()
      .map_err(|_| LcuError::Unreachable("invalid protocol header".to_string()))?,
  );

  let (socket, _response) = tokio_tungstenite::connect_async_tls_with_config(
    request,
    None,
    false,
    Some(Connector::NativeTls(tls)),
  )
  .await
  .map_err(|e| LcuError::Unreachable(e.to_string()))?;
  Ok(socket)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_close_without_client_confirms() {
    let dir = tempfile::tempdir().unwrap();
    let client = LcuClient::new().unwrap();
    let (handle, mut rx) = LcuGateway::start(
      client.clone(),
      vec![dir.path().to_path_buf()],
      vec!["/lol-gameflow/v1/gameflow-phase".to_string()],
    );

    assert!(handle.close(Duration::from_secs(2)).await);
    assert!(!client.is_connected());
    // No client ever appeared, so nothing was reported.
    assert!(rx.try_recv().is_err());
  }
}
