//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scale of the native currency unless configured otherwise.
pub const DEFAULT_NATIVE_SCALE: u32 = 18;

/// Scale applied to `amount`/`balance`-like fields unless configured otherwise.
pub const DEFAULT_TOKEN_SCALE: u32 = 18;

/// Environment variable holding the RPC endpoint URL.
pub const ENV_RPC_URL: &str = "CHAINGATE_RPC_URL";
/// Environment variable overriding the native scale.
pub const ENV_NATIVE_SCALE: &str = "CHAINGATE_NATIVE_SCALE";
/// Environment variable overriding the token scale.
pub const ENV_TOKEN_SCALE: &str = "CHAINGATE_TOKEN_SCALE";

/// Configuration for a dispatcher and the transport built for it.
///
/// The endpoint is optional on purpose: it is checked when a call is made,
/// not when the configuration is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// JSON-RPC endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Decimal exponent of the native currency (wei-style units).
    #[serde(default = "default_native_scale")]
    pub native_scale: u32,
    /// Decimal exponent used for `amount`/`balance`-like request fields.
    #[serde(default = "default_token_scale")]
    pub token_scale: u32,
    /// Field names treated as opaque identifiers in addition to the built-in set.
    #[serde(default)]
    pub extra_identifier_fields: Vec<String>,
    /// Per-request timeout used by network transports.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_native_scale() -> u32 {
    DEFAULT_NATIVE_SCALE
}

fn default_token_scale() -> u32 {
    DEFAULT_TOKEN_SCALE
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            native_scale: DEFAULT_NATIVE_SCALE,
            token_scale: DEFAULT_TOKEN_SCALE,
            extra_identifier_fields: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    /// Read the configuration from `CHAINGATE_*` environment variables.
    ///
    /// Unset or unparseable scale variables fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.endpoint = lookup(ENV_RPC_URL).filter(|s| !s.trim().is_empty());
        if let Some(scale) = lookup(ENV_NATIVE_SCALE).and_then(|s| s.trim().parse().ok()) {
            config.native_scale = scale;
        }
        if let Some(scale) = lookup(ENV_TOKEN_SCALE).and_then(|s| s.trim().parse().ok()) {
            config.token_scale = scale;
        }
        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_native_scale(mut self, scale: u32) -> Self {
        self.native_scale = scale;
        self
    }

    pub fn with_token_scale(mut self, scale: u32) -> Self {
        self.token_scale = scale;
        self
    }

    /// Register an extra field name to be left untouched by the normalizer.
    pub fn with_identifier_field(mut self, name: impl Into<String>) -> Self {
        self.extra_identifier_fields.push(name.into());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
