// REST side of the control-plane connection

use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::trace;

use super::types::LcuCredentials;
use crate::error::LcuError;

/// Request/response calls against the League client.
///
/// Implementations may be called concurrently from several handlers.
#[async_trait]
pub trait LcuApi: Send + Sync {
  async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, LcuError>;

  async fn get(&self, path: &str) -> Result<Value, LcuError> {
    self.call(Method::GET, path, None).await
  }

  async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, LcuError> {
    self.call(Method::POST, path, body).await
  }

  async fn patch(&self, path: &str, body: Value) -> Result<Value, LcuError> {
    self.call(Method::PATCH, path, Some(body)).await
  }
}

/// HTTP client bound to whatever credentials the gateway last connected with.
#[derive(Clone)]
pub struct LcuClient {
  http: reqwest::Client,
  credentials: Arc<RwLock<Option<LcuCredentials>>>,
}

impl LcuClient {
  pub fn new() -> Result<Self, LcuError> {
    let http = reqwest::Client::builder()
      .danger_accept_invalid_certs(true)
      .timeout(Duration::from_secs(5))
      .connect_timeout(Duration::from_secs(2))
      .pool_max_idle_per_host(2)
      .build()
      .map_err(|e| LcuError::Unreachable(format!("failed to build http client: {}", e)))?;
    Ok(Self {
      http,
      credentials: Arc::new(RwLock::new(None)),
    })
  }

  pub(crate) fn set_credentials(&self, creds: LcuCredentials) {
    if let Ok(mut guard) = self.credentials.write() {
      *guard = Some(creds);
    }
  }

  pub(crate) fn clear_credentials(&self) {
    if let Ok(mut guard) = self.credentials.write() {
      *guard = None;
    }
  }

  pub fn is_connected(&self) -> bool {
    self
      .credentials
      .read()
      .map(|guard| guard.is_some())
      .unwrap_or(false)
  }

  fn current_credentials(&self) -> Result<LcuCredentials, LcuError> {
    self
      .credentials
      .read()
      .ok()
      .and_then(|guard| guard.clone())
      .ok_or_else(|| LcuError::Unreachable("not connected to the league client".to_string()))
  }
}

#[async_trait]
impl LcuApi for LcuClient {
  async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, LcuError> {
    let creds = self.current_credentials()?;
    let url = url::Url::parse(&creds.rest_base())
      .and_then(|base| base.join(path))
      .map_err(|e| LcuError::Unreachable(format!("bad request url {}: {}", path, e)))?;

    trace!("[Gateway] {} {}", method, path);
    let mut request = self
      .http
      .request(method, url)
      .header("Authorization", creds.auth_header());
    if let Some(body) = body {
      request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(LcuError::ClientError(status));
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
  }
}
