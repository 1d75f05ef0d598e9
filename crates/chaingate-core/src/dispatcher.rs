//! JSON-RPC dispatcher: envelopes, correlation ids, middleware, batching and
//! error classification.
//!
//! Per call:
//! ```text
//! Built → request middleware → Sent → response middleware → Succeeded | StructuredError | TransportError
//! ```
//! There is no retry loop in here; retries belong to the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, TransportError};
use crate::middleware::{MiddlewareStack, RequestMiddleware, ResponseMiddleware};
use crate::normalize::Normalizer;
use crate::request::{self, JsonRpcRequest, RawResponse, RpcCall, RpcId};
use crate::transport::RpcTransport;

/// Outcome of one element of [`RpcDispatcher::batch_call`].
pub type BatchResult = Result<Value, GatewayError>;

/// Dispatches single and batched JSON-RPC calls over an [`RpcTransport`].
///
/// Middleware registration takes `&mut self`: register everything during
/// setup, then share the dispatcher (e.g. behind an `Arc`) for dispatch.
pub struct RpcDispatcher {
    transport: Option<Arc<dyn RpcTransport>>,
    middleware: MiddlewareStack,
    normalizer: Normalizer,
    next_id: AtomicU64,
}

impl RpcDispatcher {
    /// A dispatcher without a transport. Every call fails with
    /// [`GatewayError::ProviderMisconfigured`] until one is set.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            transport: None,
            middleware: MiddlewareStack::new(),
            normalizer: Normalizer::from_config(config),
            next_id: AtomicU64::new(1),
        }
    }

    /// A dispatcher sending through `transport`.
    pub fn with_transport(config: &GatewayConfig, transport: Arc<dyn RpcTransport>) -> Self {
        let mut dispatcher = Self::new(config);
        dispatcher.transport = Some(transport);
        dispatcher
    }

    pub fn set_transport(&mut self, transport: Arc<dyn RpcTransport>) {
        self.transport = Some(transport);
    }

    /// Replace the normalizer, e.g. to use a custom identifier set.
    pub fn set_normalizer(&mut self, normalizer: Normalizer) {
        self.normalizer = normalizer;
    }

    pub fn register_request_middleware(&mut self, m: impl RequestMiddleware) {
        self.middleware.push_request(m);
    }

    pub fn register_response_middleware(&mut self, m: impl ResponseMiddleware) {
        self.middleware.push_response(m);
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn middleware(&self) -> &MiddlewareStack {
        &self.middleware
    }

    /// URL of the configured transport, if any.
    pub fn url(&self) -> Option<&str> {
        self.transport.as_deref().map(|t| t.url())
    }

    fn transport(&self) -> Result<&Arc<dyn RpcTransport>, GatewayError> {
        self.transport
            .as_ref()
            .ok_or(GatewayError::ProviderMisconfigured)
    }

    /// Reserve `n` consecutive ids and return the first.
    fn reserve_ids(&self, n: u64) -> u64 {
        self.next_id.fetch_add(n, Ordering::Relaxed)
    }

    /// Call `method` and return its normalized result.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, GatewayError> {
        let result = self.call_raw(method, params).await?;
        Ok(self.normalizer.normalize_result(method, result))
    }

    /// Like [`call`](Self::call) but returns the result exactly as the node sent it.
    ///
    /// For payloads that are opaque bytes to this layer, such as ABI-encoded
    /// `eth_call` output.
    pub async fn call_raw(&self, method: &str, params: Vec<Value>) -> Result<Value, GatewayError> {
        let transport = self.transport()?;

        let envelope = JsonRpcRequest::new(self.reserve_ids(1), method, params);
        let envelope = self.middleware.apply_request(envelope).await;
        tracing::debug!(id = %envelope.id, method = %envelope.method, url = transport.url(), "dispatching call");

        let raw = transport.send(envelope.clone()).await.map_err(|e| {
            tracing::warn!(id = %envelope.id, method, error = %e, "transport failure");
            GatewayError::transport(method, e)
        })?;
        let raw = self.middleware.apply_response(raw, &envelope).await;

        request::into_result(raw).map_err(|e| {
            tracing::debug!(id = %envelope.id, method, code = e.code, message = %e.message, "node returned error");
            GatewayError::Rpc(e)
        })
    }

    /// Send `calls` as one batch.
    ///
    /// Always returns one slot per input call, in input order, whatever order
    /// the node answers in. A batch-wide transport failure is copied into
    /// every slot.
    ///
    /// Response middleware sees every raw element before correlation, so it
    /// may rewrite the `id` a response is matched on.
    pub async fn batch_call(&self, calls: Vec<RpcCall>) -> Vec<BatchResult> {
        if calls.is_empty() {
            return Vec::new();
        }
        let transport = match self.transport() {
            Ok(t) => t,
            Err(e) => return calls.iter().map(|_| Err(e.clone())).collect(),
        };

        let first_id = self.reserve_ids(calls.len() as u64);
        let envelopes = join_all(calls.iter().enumerate().map(|(i, c)| {
            let envelope = JsonRpcRequest::new(first_id + i as u64, c.method.clone(), c.params.clone());
            self.middleware.apply_request(envelope)
        }))
        .await;
        tracing::debug!(size = envelopes.len(), first_id, url = transport.url(), "dispatching batch");

        let raw = match transport.send_batch(envelopes.clone()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(size = calls.len(), error = %e, "batch transport failure");
                return calls
                    .iter()
                    .map(|c| Err(GatewayError::transport(&c.method, e.clone())))
                    .collect();
            }
        };

        let index = EnvelopeIndex::new(&envelopes);
        let answered = join_all(
            raw.into_iter()
                .enumerate()
                .map(|(position, resp)| self.respond(position, resp, &envelopes, &index)),
        )
        .await;

        // Middleware may have rewritten ids, so correlate on its output.
        let mut correlated: Vec<(Option<u64>, usize, RawResponse)> = answered
            .into_iter()
            .flatten()
            .filter_map(|resp| {
                let id = request::response_id(&resp);
                match id.as_ref().and_then(|id| index.locate(id)) {
                    Some(slot) => Some((id.and_then(|id| id.as_u64()), slot, resp)),
                    None => {
                        tracing::warn!(id = ?id, "dropping batch response with unknown id");
                        None
                    }
                }
            })
            .collect();
        // Transports need not preserve submission order. Numeric ids sort
        // first; anything else keeps its submission position.
        correlated.sort_by_key(|(id, slot, _)| match id {
            Some(n) => (0, *n),
            None => (1, *slot as u64),
        });

        let mut slots: Vec<Option<BatchResult>> = calls.iter().map(|_| None).collect();
        for (_, slot, resp) in correlated {
            if slots[slot].is_some() {
                continue;
            }
            let method = &calls[slot].method;
            slots[slot] = Some(
                request::into_result(resp)
                    .map(|result| self.normalizer.normalize_result(method, result))
                    .map_err(GatewayError::Rpc),
            );
        }

        slots
            .into_iter()
            .zip(envelopes.iter().zip(calls.iter()))
            .map(|(slot, (env, call))| {
                slot.unwrap_or_else(|| {
                    Err(GatewayError::transport(
                        &call.method,
                        TransportError::Other(format!("no response for request id {}", env.id)),
                    ))
                })
            })
            .collect()
    }

    /// Run response middleware on one raw batch element.
    ///
    /// The middleware sees the envelope the element's own id points at, or
    /// the envelope at the same position when that id matches nothing.
    async fn respond(
        &self,
        position: usize,
        resp: RawResponse,
        envelopes: &[JsonRpcRequest],
        index: &EnvelopeIndex,
    ) -> Option<RawResponse> {
        let slot = request::response_id(&resp)
            .and_then(|id| index.locate(&id))
            .unwrap_or(position);
        let Some(envelope) = envelopes.get(slot) else {
            tracing::warn!(position, "dropping surplus batch response");
            return None;
        };
        Some(self.middleware.apply_response(resp, envelope).await)
    }
}

/// Lookup from envelope id to batch position.
///
/// Ids match exactly first; failing that, a numeric string and a number
/// with the same value are treated as the same id.
struct EnvelopeIndex {
    exact: HashMap<RpcId, usize>,
    numeric: HashMap<u64, usize>,
}

impl EnvelopeIndex {
    fn new(envelopes: &[JsonRpcRequest]) -> Self {
        let mut exact = HashMap::with_capacity(envelopes.len());
        let mut numeric = HashMap::with_capacity(envelopes.len());
        for (i, env) in envelopes.iter().enumerate() {
            exact.entry(env.id.clone()).or_insert(i);
            if let Some(n) = env.id.as_u64() {
                numeric.entry(n).or_insert(i);
            }
        }
        Self { exact, numeric }
    }

    fn locate(&self, id: &RpcId) -> Option<usize> {
        self.exact
            .get(id)
            .or_else(|| id.as_u64().and_then(|n| self.numeric.get(&n)))
            .copied()
    }
}

impl std::fmt::Debug for RpcDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcDispatcher")
            .field("url", &self.url())
            .field("middleware", &self.middleware)
            .field("normalizer", &self.normalizer)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl RpcTransport for Echo {
        async fn send(&self, req: JsonRpcRequest) -> Result<RawResponse, TransportError> {
            Ok(json!({"jsonrpc": "2.0", "id": req.id, "result": req.id}))
        }
        fn url(&self) -> &str {
            "echo"
        }
    }

    fn dispatcher() -> RpcDispatcher {
        RpcDispatcher::with_transport(&GatewayConfig::default(), Arc::new(Echo))
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let d = dispatcher();
        assert_eq!(d.call("a", vec![]).await.unwrap(), json!(1));
        assert_eq!(d.call("b", vec![]).await.unwrap(), json!(2));
        let batch = d
            .batch_call(vec![RpcCall::new("c", vec![]), RpcCall::new("d", vec![])])
            .await;
        assert_eq!(batch[0].as_ref().unwrap(), &json!(3));
        assert_eq!(batch[1].as_ref().unwrap(), &json!(4));
        assert_eq!(d.call("e", vec![]).await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn dispatchers_do_not_share_counters() {
        let a = dispatcher();
        let b = dispatcher();
        a.call("x", vec![]).await.unwrap();
        assert_eq!(b.call("x", vec![]).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn missing_transport_is_misconfigured() {
        let d = RpcDispatcher::new(&GatewayConfig::default());
        assert!(matches!(
            d.call("eth_chainId", vec![]).await,
            Err(GatewayError::ProviderMisconfigured)
        ));
        let batch = d.batch_call(vec![RpcCall::new("eth_chainId", vec![])]).await;
        assert_eq!(batch.len(), 1);
        assert!(matches!(batch[0], Err(GatewayError::ProviderMisconfigured)));
        assert_eq!(d.url(), None);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        assert!(dispatcher().batch_call(vec![]).await.is_empty());
    }
}
