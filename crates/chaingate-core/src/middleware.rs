//! Request / response middleware.
//!
//! Middleware run strictly in registration order and each one is awaited
//! before the next starts:
//! ```text
//! Envelope → [req 1] → [req 2] → … → Transport → [resp 1] → [resp 2] → … → Normalizer
//! ```
//! Plain async closures implement both traits, so registration usually looks like
//! `dispatcher.register_request_middleware(|req| async move { req })`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::request::{JsonRpcRequest, RawResponse};

/// Transforms an outbound envelope.
#[async_trait]
pub trait RequestMiddleware: Send + Sync + 'static {
    async fn on_request(&self, req: JsonRpcRequest) -> JsonRpcRequest;
}

/// Transforms a raw response. The envelope it answers is passed for context.
#[async_trait]
pub trait ResponseMiddleware: Send + Sync + 'static {
    async fn on_response(&self, resp: RawResponse, req: &JsonRpcRequest) -> RawResponse;
}

#[async_trait]
impl<F, Fut> RequestMiddleware for F
where
    F: Fn(JsonRpcRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JsonRpcRequest> + Send,
{
    async fn on_request(&self, req: JsonRpcRequest) -> JsonRpcRequest {
        (self)(req).await
    }
}

#[async_trait]
impl<F, Fut> ResponseMiddleware for F
where
    F: Fn(RawResponse, JsonRpcRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RawResponse> + Send,
{
    async fn on_response(&self, resp: RawResponse, req: &JsonRpcRequest) -> RawResponse {
        (self)(resp, req.clone()).await
    }
}

/// Append-only, ordered middleware lists.
#[derive(Default, Clone)]
pub struct MiddlewareStack {
    request: Vec<Arc<dyn RequestMiddleware>>,
    response: Vec<Arc<dyn ResponseMiddleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_request(&mut self, m: impl RequestMiddleware) {
        self.request.push(Arc::new(m));
    }

    pub fn push_response(&mut self, m: impl ResponseMiddleware) {
        self.response.push(Arc::new(m));
    }

    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Left fold of the request chain over `req`.
    pub async fn apply_request(&self, mut req: JsonRpcRequest) -> JsonRpcRequest {
        for m in &self.request {
            req = m.on_request(req).await;
        }
        req
    }

    /// Left fold of the response chain over `resp`.
    pub async fn apply_response(&self, mut resp: RawResponse, req: &JsonRpcRequest) -> RawResponse {
        for m in &self.response {
            resp = m.on_response(resp, req).await;
        }
        resp
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Rename(&'static str);

    #[async_trait]
    impl RequestMiddleware for Rename {
        async fn on_request(&self, mut req: JsonRpcRequest) -> JsonRpcRequest {
            req.method = self.0.to_string();
            req
        }
    }

    #[tokio::test]
    async fn request_chain_runs_in_registration_order() {
        let mut stack = MiddlewareStack::new();
        stack.push_request(|mut req: JsonRpcRequest| async move {
            req.params.push(json!("first"));
            req
        });
        stack.push_request(|mut req: JsonRpcRequest| async move {
            tokio::task::yield_now().await;
            req.params.push(json!("second"));
            req
        });
        stack.push_request(Rename("eth_blockNumber"));

        let out = stack
            .apply_request(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await;
        assert_eq!(out.params, vec![json!("first"), json!("second")]);
        assert_eq!(out.method, "eth_blockNumber");
        assert_eq!(stack.request_len(), 3);
    }

    #[tokio::test]
    async fn response_chain_sees_the_envelope() {
        let mut stack = MiddlewareStack::new();
        stack.push_response(|mut resp: Value, req: JsonRpcRequest| async move {
            resp["seenMethod"] = json!(req.method);
            resp
        });
        let req = JsonRpcRequest::new(3, "eth_gasPrice", vec![]);
        let out = stack.apply_response(json!({"id": 3, "result": "0x1"}), &req).await;
        assert_eq!(out["seenMethod"], json!("eth_gasPrice"));
        assert_eq!(out["result"], json!("0x1"));
    }

    #[tokio::test]
    async fn empty_stack_is_identity() {
        let stack = MiddlewareStack::new();
        let req = JsonRpcRequest::new(1, "net_version", vec![]);
        assert_eq!(stack.apply_request(req.clone()).await, req);
    }
}
