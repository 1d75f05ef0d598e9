//! Narrow interface to the external signing module.
//!
//! The gateway never interprets key material or signatures. It hands the
//! wire-encoded transaction and an opaque key to a [`Signer`] and forwards
//! whatever blob comes back, untouched, to `eth_sendRawTransaction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Opaque key material. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial(<{} bytes redacted>)", self.0.len())
    }
}

/// What a signer returns: the raw signed transaction under either key name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    #[serde(alias = "rawTransaction")]
    pub raw: String,
}

impl SignedPayload {
    /// Read a signer response of the form `{raw}` or `{rawTransaction}`.
    pub fn from_value(v: Value) -> Result<Self, GatewayError> {
        serde_json::from_value(v).map_err(|e| GatewayError::Signer(e.to_string()))
    }

    /// The wire-ready blob, exactly as the signer produced it.
    pub fn as_wire(&self) -> &str {
        &self.raw
    }
}

/// The external signing module.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign a wire-encoded transaction payload.
    async fn sign(&self, payload: &Value, key: &KeyMaterial) -> Result<SignedPayload, GatewayError>;
}
