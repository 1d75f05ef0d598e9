//! chaingate-http — HTTP JSON-RPC transport for ChainGate.
//!
//! # Quick start
//! ```rust,no_run
//! use chaingate_core::{ChainClient, GatewayConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default().with_endpoint("https://rpc.example.com");
//! let client = ChainClient::new(Arc::new(chaingate_http::connect(&config)?));
//! let chain_id = client.chain_id().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

use std::sync::Arc;

use chaingate_core::{GatewayConfig, RpcDispatcher, TransportError};

pub use client::{HttpClientConfig, HttpRpcClient};

/// Build a dispatcher for `config`.
///
/// A missing endpoint is not an error here: the dispatcher is returned
/// without a transport and every call on it fails with
/// [`ProviderMisconfigured`](chaingate_core::GatewayError::ProviderMisconfigured).
pub fn connect(config: &GatewayConfig) -> Result<RpcDispatcher, TransportError> {
    let Some(endpoint) = config.endpoint.as_deref() else {
        tracing::debug!("no endpoint configured; dispatcher has no transport");
        return Ok(RpcDispatcher::new(config));
    };
    let http = HttpRpcClient::new(
        endpoint,
        HttpClientConfig {
            request_timeout: config.request_timeout(),
        },
    )?;
    Ok(RpcDispatcher::with_transport(config, Arc::new(http)))
}
