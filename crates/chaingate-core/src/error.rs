//! Error taxonomy for the gateway.
//!
//! Two layers:
//! - [`TransportError`] — what an [`RpcTransport`](crate::transport::RpcTransport)
//!   reports when the bytes never made it to (or back from) the node.
//! - [`GatewayError`] — what callers of the dispatcher and the typed call
//!   surface see. Transport failures are wrapped with the method name.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response body could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}

/// Errors surfaced by the dispatcher, the normalizer and the unit primitives.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No endpoint / transport configured.
    #[error("Provider misconfigured: no RPC endpoint set")]
    ProviderMisconfigured,

    /// String is not a valid `0x`-prefixed hexadecimal integer.
    #[error("Invalid hex format: {value:?}")]
    InvalidHexFormat { value: String },

    /// More fractional digits than the scale can represent.
    #[error("Value {value} has more than {scale} fractional digits")]
    OverflowPrecision { value: String, scale: u32 },

    /// Value is not a usable decimal number for the requested conversion.
    #[error("Invalid number {value:?}: {reason}")]
    InvalidNumber { value: String, reason: String },

    /// The node returned a structured JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// The call failed below the JSON-RPC layer.
    #[error("Transport error in {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: TransportError,
    },

    /// The external signing module rejected the payload.
    #[error("Signer error: {0}")]
    Signer(String),

    /// The external ABI codec could not decode the call output.
    #[error("ABI error: {0}")]
    Abi(String),
}

impl GatewayError {
    pub(crate) fn transport(method: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            method: method.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by caller input or setup. Never worth retrying.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderMisconfigured
                | Self::InvalidHexFormat { .. }
                | Self::OverflowPrecision { .. }
                | Self::InvalidNumber { .. }
        )
    }

    /// Returns `true` if the node explicitly rejected the call.
    pub fn is_rpc_error(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }

    /// Returns `true` if the failure happened at the transport layer.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The upstream JSON-RPC error object, if any.
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Rpc(e) => Some(e),
            _ => None,
        }
    }
}
