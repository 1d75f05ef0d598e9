//! The `RpcTransport` trait — the seam between the dispatcher and the network.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, RawResponse};

/// Moves envelopes to a node and raw responses back.
///
/// Transports never interpret responses: a JSON-RPC `error` member is a
/// successful transport round-trip. Only failures below the JSON-RPC layer
/// are reported as [`TransportError`].
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the raw response.
    async fn send(&self, req: JsonRpcRequest) -> Result<RawResponse, TransportError>;

    /// Send a batch of JSON-RPC requests.
    ///
    /// Responses may come back in any order. Default implementation sends
    /// them sequentially; override for true batching.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<RawResponse>, TransportError> {
        let mut responses = Vec::with_capacity(reqs.len());
        for req in reqs {
            responses.push(self.send(req).await?);
        }
        Ok(responses)
    }

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}
