//! JSON-RPC 2.0 wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request ID — string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl RpcId {
    pub fn number(n: u64) -> Self {
        Self::Number(n)
    }

    /// Numeric value of the id, if it is (or parses as) an unsigned integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            Self::Null => None,
        }
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A single JSON-RPC parameter value.
pub type RpcParam = Value;

/// A JSON-RPC 2.0 request — the envelope threaded through request middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RpcId,
    pub method: String,
    pub params: Vec<RpcParam>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: RpcId::Number(id),
            method: method.into(),
            params,
        }
    }
}

/// One element of a batch: a method name and its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCall {
    pub method: String,
    #[serde(default)]
    pub params: Vec<RpcParam>,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Lenient conversion of whatever the node put under `error`.
    ///
    /// Nodes are not always strict: a bare string or a missing `code` still
    /// counts as a structured rejection.
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::Object(obj) => Self {
                code: obj.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| v.to_string()),
                data: obj.get("data").cloned(),
            },
            Value::String(s) => Self {
                code: 0,
                message: s.clone(),
                data: None,
            },
            other => Self {
                code: 0,
                message: other.to_string(),
                data: None,
            },
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A raw response exactly as the transport produced it.
///
/// Kept untyped because response middleware may rewrite it freely and some
/// nodes answer without a `result` wrapper.
pub type RawResponse = Value;

/// Correlation id of a raw response.
///
/// `None` when the member is missing, `null`, or not a valid id.
pub fn response_id(resp: &RawResponse) -> Option<RpcId> {
    match resp.get("id")? {
        Value::Number(n) => n.as_u64().map(RpcId::Number),
        Value::String(s) => Some(RpcId::String(s.clone())),
        _ => None,
    }
}

/// Split a raw response into its payload or its structured error.
///
/// A non-null `error` member wins. Otherwise the `result` member is returned,
/// or the whole response when there is no `result` wrapper.
pub fn into_result(resp: RawResponse) -> Result<Value, JsonRpcError> {
    match resp {
        Value::Object(mut obj) => {
            if let Some(err) = obj.get("error").filter(|e| !e.is_null()) {
                return Err(JsonRpcError::from_value(err));
            }
            match obj.remove("result") {
                Some(result) => Ok(result),
                None => Ok(Value::Object(obj)),
            }
        }
        other => Ok(other),
    }
}
