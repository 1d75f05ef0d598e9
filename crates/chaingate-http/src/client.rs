//! HTTP JSON-RPC transport backed by `reqwest`.
//!
//! Features:
//! - Single requests as one JSON object per POST
//! - True HTTP batching (one JSON array per POST)
//! - Per-request timeout
//!
//! Responses are returned raw: a JSON-RPC `error` member is not a transport
//! failure. Retries are left to the caller.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use chaingate_core::error::TransportError;
use chaingate_core::request::{JsonRpcRequest, RawResponse};
use chaingate_core::transport::RpcTransport;

/// Configuration for `HttpRpcClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP JSON-RPC transport.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpRpcClient {
    /// Create a new client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpClientConfig::default())
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, body: &B) -> Result<RawResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_slice::<RawResponse>(&bytes)?)
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<RawResponse, TransportError> {
        tracing::trace!(url = %self.url, id = %req.id, method = %req.method, "POST single");
        self.post(&req).await
    }

    /// True HTTP batch: send all requests as a JSON array in one HTTP call.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<RawResponse>, TransportError> {
        if reqs.is_empty() {
            return Ok(vec![]);
        }
        tracing::trace!(url = %self.url, size = reqs.len(), "POST batch");

        match self.post(&reqs).await? {
            Value::Array(items) => Ok(items),
            // Some nodes reject a whole batch with one error object.
            other @ Value::Object(_) => Err(TransportError::Http(format!(
                "expected batch array, got: {other}"
            ))),
            other => Err(TransportError::Deserialization(format!(
                "expected batch array, got: {other}"
            ))),
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}
