//! Narrow interface to the external ABI library.
//!
//! Call data arrives here already encoded; output decoding is delegated to an
//! [`AbiCodec`]. The gateway only moves bytes and normalizes the decoded tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Name and shape of one contract output, as the ABI library describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub name: String,
    /// Solidity-style type string, e.g. `uint256`, `address`, `(uint256,bool)[]`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl OutputDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Decodes raw `eth_call` output into a structured value.
pub trait AbiCodec: Send + Sync {
    fn decode_output(&self, data: &str, outputs: &[OutputDescriptor]) -> Result<Value, GatewayError>;
}
