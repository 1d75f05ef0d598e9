//! Field-name driven value normalization.
//!
//! Outbound payloads are flat transaction-like objects whose human-entered
//! amounts are scaled *up* to base units ([`Normalizer::serialize_for_wire`]).
//! Inbound responses are arbitrary trees whose wire integers are rendered as
//! decimals *without* rescaling ([`Normalizer::normalize_from_wire`]). The two
//! directions are deliberately not inverses of each other.
//!
//! Classification is a pure function of the field name, see [`classify_field`].

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::units::{self, Numeric};

/// Field names that always hold opaque hex identifiers.
pub const IDENTIFIER_FIELDS: &[&str] = &[
    "address",
    "hash",
    "from",
    "to",
    "transactionHash",
    "blockHash",
    "contractAddress",
    "parentHash",
    "sha3Uncles",
    "miner",
    "stateRoot",
    "transactionsRoot",
    "receiptsRoot",
    "withdrawalsRoot",
    "parentBeaconBlockRoot",
    "logsBloom",
    "mixHash",
    "extraData",
    "input",
    "data",
    "topics",
    "root",
    "storageHash",
    "codeHash",
    "requestsHash",
    "key",
    "proof",
    "r",
    "s",
    "raw",
    "signature",
    "publicKey",
];

/// The field that carries a native-currency amount on outbound transactions.
pub const NATIVE_VALUE_FIELD: &str = "value";

/// How a payload field is treated by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Opaque hex identifier — never numerically reinterpreted.
    Identifier,
    /// Native currency amount — scaled by the native scale on the way out.
    NativeValue,
    /// `amount`/`balance`-like field — scaled by the token scale on the way out.
    ScaledAmount,
    /// Any other integer quantity.
    PlainInteger,
}

/// How a bare method result is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    /// Native-currency balance, rendered in whole units.
    NativeValue,
    /// Everything else.
    Plain,
}

/// The closed set of identifier field names, optionally extended by the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSet {
    names: HashSet<String>,
}

impl IdentifierSet {
    /// The built-in [`IDENTIFIER_FIELDS`].
    pub fn standard() -> Self {
        Self {
            names: IDENTIFIER_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The built-in set plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::standard();
        set.names.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for IdentifierSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Classify a field by name alone.
pub fn classify_field(name: &str, identifiers: &IdentifierSet) -> FieldClass {
    if identifiers.contains(name) {
        return FieldClass::Identifier;
    }
    if name == NATIVE_VALUE_FIELD {
        return FieldClass::NativeValue;
    }
    let lower = name.to_ascii_lowercase();
    if lower.contains("amount") || lower.contains("balance") {
        FieldClass::ScaledAmount
    } else {
        FieldClass::PlainInteger
    }
}

/// Classify a method by the kind of bare value it returns.
pub fn classify_method(method: &str) -> ResultClass {
    if method.ends_with("getBalance") {
        ResultClass::NativeValue
    } else {
        ResultClass::Plain
    }
}

/// `"42"` / `"1.5"` — digits with an optional fraction, nothing else.
fn is_numeric_text(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// Applies the unit conversion policy to request and response payloads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    native_scale: u32,
    token_scale: u32,
    identifiers: IdentifierSet,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

impl Normalizer {
    pub fn new(native_scale: u32, token_scale: u32, identifiers: IdentifierSet) -> Self {
        Self {
            native_scale,
            token_scale,
            identifiers,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.native_scale,
            config.token_scale,
            IdentifierSet::with_extra(config.extra_identifier_fields.iter().cloned()),
        )
    }

    pub fn native_scale(&self) -> u32 {
        self.native_scale
    }

    pub fn token_scale(&self) -> u32 {
        self.token_scale
    }

    pub fn identifiers(&self) -> &IdentifierSet {
        &self.identifiers
    }

    pub fn classify(&self, field: &str) -> FieldClass {
        classify_field(field, &self.identifiers)
    }

    /// Encode the numeric top-level fields of an outbound payload.
    ///
    /// Numbers and digit strings are converted according to the field's
    /// [`FieldClass`]; everything else (hex strings included) passes through.
    /// Non-object payloads are returned unchanged.
    pub fn serialize_for_wire(&self, payload: &Value) -> Result<Value, GatewayError> {
        let Value::Object(fields) = payload else {
            return Ok(payload.clone());
        };

        let mut out = Map::with_capacity(fields.len());
        for (name, value) in fields {
            let numeric = match value {
                Value::Number(_) => true,
                Value::String(s) => is_numeric_text(s),
                _ => false,
            };
            let encoded = match self.classify(name) {
                FieldClass::Identifier => value.clone(),
                _ if !numeric => value.clone(),
                FieldClass::NativeValue => {
                    Value::String(units::parse_scaled_units(Numeric::try_from(value)?, self.native_scale)?)
                }
                FieldClass::ScaledAmount => {
                    Value::String(units::parse_scaled_units(Numeric::try_from(value)?, self.token_scale)?)
                }
                FieldClass::PlainInteger => {
                    Value::String(units::decimal_to_hex(Numeric::try_from(value)?)?)
                }
            };
            out.insert(name.clone(), encoded);
        }
        Ok(Value::Object(out))
    }

    /// Render every wire integer in a response tree as a decimal.
    ///
    /// - `null` becomes an empty object, booleans and numbers are unchanged.
    /// - A bare string is a single wire value unless it is long hex (40+
    ///   digits), which is presumed to be an address or hash.
    /// - Object fields in the identifier set are copied verbatim; any other
    ///   hex field is converted whatever its length.
    /// - Array elements that are objects are walked; scalar elements pass through.
    ///
    /// Strings that are not well-formed wire integers are left alone.
    pub fn normalize_from_wire(&self, value: Value) -> Value {
        match value {
            Value::Null => Value::Object(Map::new()),
            // A bare 40+ digit hex string is an address or hash.
            Value::String(s) if units::is_long_hex(&s) => Value::String(s),
            Value::String(s) => self.normalize_string(s),
            Value::Array(items) => self.normalize_array(items),
            Value::Object(fields) => self.normalize_object(fields),
            other => other,
        }
    }

    /// Normalize the result of `method`.
    ///
    /// Balance-returning methods yield a bare base-unit integer which is
    /// rendered in whole native units; everything else goes through
    /// [`normalize_from_wire`](Self::normalize_from_wire).
    pub fn normalize_result(&self, method: &str, value: Value) -> Value {
        if classify_method(method) == ResultClass::NativeValue {
            if let Some(wire) = value.as_str().filter(|s| units::is_wire_value(s)) {
                if let Ok(whole) = units::format_scaled_units(wire, self.native_scale) {
                    return Value::String(whole);
                }
            }
        }
        self.normalize_from_wire(value)
    }

    fn normalize_string(&self, s: String) -> Value {
        if !units::is_wire_value(&s) {
            return Value::String(s);
        }
        match units::hex_to_decimal(&s) {
            Ok(decimal) => decimal.into_json(),
            Err(_) => Value::String(s),
        }
    }

    fn normalize_array(&self, items: Vec<Value>) -> Value {
        Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(fields) => self.normalize_object(fields),
                    scalar => scalar,
                })
                .collect(),
        )
    }

    fn normalize_object(&self, fields: Map<String, Value>) -> Value {
        let mut out = Map::with_capacity(fields.len());
        for (name, value) in fields {
            let normalized = if self.identifiers.contains(&name) {
                value
            } else {
                match value {
                    Value::String(s) => self.normalize_string(s),
                    Value::Array(items) => self.normalize_array(items),
                    Value::Object(nested) => self.normalize_object(nested),
                    other => other,
                }
            };
            out.insert(name, normalized);
        }
        Value::Object(out)
    }
}
