//! HTTP transport for the agent service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AgentTransport, ClientError};
use crate::config::ServerConfig;

/// Header carrying a per-request id for log correlation
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Build the shared transport for the configured server
pub fn connect(config: &ServerConfig) -> Result<Arc<dyn AgentTransport>, ClientError> {
    Ok(Arc::new(HttpTransport::from_config(config)?))
}

/// reqwest-backed `AgentTransport`
///
/// Timeouts are enforced here, by the HTTP client; a timed out request is
/// reported as `TransportUnreachable`.
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    /// Create a transport from server configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self, ClientError> {
        debug!(?config, "from_config: called");
        Self::new(config.base_url(), Duration::from_millis(config.timeout_ms))
    }

    /// Create a transport for an explicit base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        debug!(%base_url, ?timeout, "new: called");

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::TransportUnreachable(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> Result<Value, ClientError> {
        let request_id = Uuid::now_v7().to_string();
        debug!(%path, %request_id, "send: called");

        let response = builder
            .header(REQUEST_ID_HEADER, &request_id)
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%path, %request_id, error = %e, "send: connection failed");
                ClientError::TransportUnreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(%path, %request_id, status = status.as_u16(), "send: non-success status");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::TransportUnreachable(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            debug!(%path, %request_id, error = %e, "send: body is not JSON");
            ClientError::MalformedResponse(e.to_string())
        })
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let builder = self.http.get(self.url(path));
        self.send(path, builder).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        let builder = self.http.post(self.url(path)).json(&body);
        self.send(path, builder).await
    }
}
