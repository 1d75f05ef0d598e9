//! Lossless conversion between wire hex integers and decimal representations.
//!
//! Every amount is held as a [`BigUint`] count of base units. A *scale* is the
//! power of ten relating one whole unit to base units (18 for wei-style
//! currencies). Nothing in here touches floating point.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde_json::Value;

use crate::error::GatewayError;

/// Canonical prefix of a wire integer.
pub const HEX_PREFIX: &str = "0x";

/// Largest integer that survives a round-trip through IEEE-754 double parsing.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Scientific exponents beyond this are refused rather than expanded.
const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// A decimal rendering of a base-unit integer.
///
/// Small values become plain numbers; anything that would lose precision as a
/// double stays a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalValue {
    Number(u64),
    Text(String),
}

impl DecimalValue {
    pub fn from_biguint(value: &BigUint) -> Self {
        match value.to_u64() {
            Some(n) if n <= MAX_SAFE_INTEGER => Self::Number(n),
            _ => Self::Text(value.to_string()),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            Self::Number(n) => Value::from(n),
            Self::Text(s) => Value::String(s),
        }
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<DecimalValue> for Value {
    fn from(v: DecimalValue) -> Self {
        v.into_json()
    }
}

/// Numeric input accepted by the decimal-to-wire primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numeric {
    /// Already an exact integer.
    Integer(BigUint),
    /// Decimal text: `"42"`, `"1.5"`, `"2e-3"`.
    Text(String),
}

impl From<BigUint> for Numeric {
    fn from(v: BigUint) -> Self {
        Self::Integer(v)
    }
}

impl From<&BigUint> for Numeric {
    fn from(v: &BigUint) -> Self {
        Self::Integer(v.clone())
    }
}

impl From<u64> for Numeric {
    fn from(v: u64) -> Self {
        Self::Integer(BigUint::from(v))
    }
}

impl From<u128> for Numeric {
    fn from(v: u128) -> Self {
        Self::Integer(BigUint::from(v))
    }
}

impl From<u32> for Numeric {
    fn from(v: u32) -> Self {
        Self::Integer(BigUint::from(v))
    }
}

impl From<&str> for Numeric {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Numeric {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl TryFrom<&Value> for Numeric {
    type Error = GatewayError;

    /// JSON numbers go through their shortest decimal text, which is exact
    /// for whatever the parser stored.
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Number(n) => match n.as_u64() {
                Some(u) => Ok(Self::from(u)),
                None => Ok(Self::Text(n.to_string())),
            },
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(GatewayError::InvalidNumber {
                value: other.to_string(),
                reason: "not a number or numeric string".into(),
            }),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Render a base-unit integer in canonical wire form (`0x` + lowercase hex).
pub fn to_wire(value: &BigUint) -> String {
    format!("{HEX_PREFIX}{value:x}")
}

/// Parse a wire integer.
///
/// The prefix is tolerated in either case and may be omitted; the bare
/// prefix `"0x"` means zero. Anything else that is not pure hex digits is
/// an [`GatewayError::InvalidHexFormat`].
pub fn parse_wire(wire: &str) -> Result<BigUint, GatewayError> {
    let invalid = || GatewayError::InvalidHexFormat {
        value: wire.to_string(),
    };
    let digits = match strip_hex_prefix(wire) {
        Some("") => return Ok(BigUint::zero()),
        Some(d) => d,
        None if wire.is_empty() => return Err(invalid()),
        None => wire,
    };
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(invalid)
}

/// Returns `true` if `s` is a prefixed, well-formed wire integer.
pub fn is_wire_value(s: &str) -> bool {
    strip_hex_prefix(s).is_some_and(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Returns `true` for prefixed hex with 40 or more digits: an address, hash or
/// other opaque byte string rather than a quantity.
pub fn is_long_hex(s: &str) -> bool {
    strip_hex_prefix(s).is_some_and(|d| d.len() >= 40 && d.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix(HEX_PREFIX).or_else(|| s.strip_prefix("0X"))
}

/// Reinterpret a wire integer as decimal. No scale is applied.
pub fn hex_to_decimal(wire: &str) -> Result<DecimalValue, GatewayError> {
    parse_wire(wire).map(|v| DecimalValue::from_biguint(&v))
}

/// Encode an integer-valued input as a wire integer.
///
/// Fractional input is refused: this primitive never rounds.
pub fn decimal_to_hex(value: impl Into<Numeric>) -> Result<String, GatewayError> {
    let value = value.into();
    let (digits, frac_len) = decompose(&value)?;
    if frac_len > 0 {
        return Err(GatewayError::InvalidNumber {
            value: value.to_string(),
            reason: "fractional value where an integer is required".into(),
        });
    }
    Ok(to_wire(&digits))
}

/// Exact wire integer for `value × 10^scale`.
///
/// More significant fractional digits than `scale` is an
/// [`GatewayError::OverflowPrecision`] instead of a silent truncation.
pub fn parse_scaled_units(value: impl Into<Numeric>, scale: u32) -> Result<String, GatewayError> {
    scaled_base_units(&value.into(), scale).map(|v| to_wire(&v))
}

/// Like [`parse_scaled_units`] but returns the base-unit integer itself.
pub fn scaled_base_units(value: &Numeric, scale: u32) -> Result<BigUint, GatewayError> {
    let (digits, frac_len) = decompose(value)?;
    if frac_len > scale {
        return Err(GatewayError::OverflowPrecision {
            value: value.to_string(),
            scale,
        });
    }
    Ok(digits * pow10(scale - frac_len))
}

/// Render a wire integer as whole units at `scale`: `"<int>"` or `"<int>.<frac>"`.
pub fn format_scaled_units(wire: &str, scale: u32) -> Result<String, GatewayError> {
    parse_wire(wire).map(|v| format_base_units(&v, scale))
}

/// Render a base-unit integer as whole units at `scale`, trailing zeros stripped.
pub fn format_base_units(value: &BigUint, scale: u32) -> String {
    let digits = value.to_string();
    let scale = scale as usize;
    if scale == 0 {
        return digits;
    }
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

fn pow10(exp: u32) -> BigUint {
    num_traits::pow(BigUint::from(10u8), exp as usize)
}

/// Split a numeric input into `digits × 10^-frac_len`, with trailing
/// fractional zeros removed so that `frac_len` counts significant digits only.
fn decompose(value: &Numeric) -> Result<(BigUint, u32), GatewayError> {
    match value {
        Numeric::Integer(v) => Ok((v.clone(), 0)),
        Numeric::Text(s) => parse_decimal(s),
    }
}

fn parse_decimal(s: &str) -> Result<(BigUint, u32), GatewayError> {
    let invalid = |reason: &str| GatewayError::InvalidNumber {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    if s.starts_with('-') {
        return Err(invalid("negative amounts have no base-unit representation"));
    }

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => {
            let exp: i64 = s[pos + 1..]
                .parse()
                .map_err(|_| invalid("malformed exponent"))?;
            if exp.abs() > MAX_DECIMAL_EXPONENT {
                return Err(invalid("exponent out of range"));
            }
            (&s[..pos], exp)
        }
        None => (s, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }

    let frac_part = frac_part.trim_end_matches('0');
    let all_digits = format!("{int_part}{frac_part}");
    let mut digits = if all_digits.is_empty() {
        BigUint::zero()
    } else {
        BigUint::parse_bytes(all_digits.as_bytes(), 10).ok_or_else(|| invalid("not a decimal number"))?
    };

    let mut frac_len = frac_part.len() as i64 - exponent;
    if frac_len < 0 {
        digits *= pow10(frac_len.unsigned_abs() as u32);
        frac_len = 0;
    }
    // Integer-part zeros can still sit inside the fraction after a negative exponent ("1500e-3").
    let ten = BigUint::from(10u8);
    while frac_len > 0 && !digits.is_zero() && (&digits % &ten).is_zero() {
        digits /= &ten;
        frac_len -= 1;
    }
    if digits.is_zero() {
        frac_len = 0;
    }
    let frac_len = u32::try_from(frac_len).map_err(|_| invalid("exponent out of range"))?;
    Ok((digits, frac_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_pow(n: u32) -> BigUint {
        pow10(n)
    }

    #[test]
    fn empty_hex_is_zero() {
        assert_eq!(hex_to_decimal("0x").unwrap(), DecimalValue::Number(0));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for bad in ["0xzz", "", "0x12g4", "0x_12", "hello"] {
            assert!(
                matches!(hex_to_decimal(bad), Err(GatewayError::InvalidHexFormat { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hex_prefix_is_optional_and_case_insensitive() {
        assert_eq!(hex_to_decimal("0XFF").unwrap(), DecimalValue::Number(255));
        assert_eq!(hex_to_decimal("ff").unwrap(), DecimalValue::Number(255));
        assert_eq!(hex_to_decimal("0xAbC").unwrap(), DecimalValue::Number(2748));
    }

    #[test]
    fn hex_to_decimal_never_scales() {
        assert_eq!(
            hex_to_decimal("0xde0b6b3a7640000").unwrap(),
            DecimalValue::Text("1000000000000000000".into())
        );
    }

    #[test]
    fn safe_integer_boundary() {
        assert_eq!(
            hex_to_decimal("0x1fffffffffffff").unwrap(),
            DecimalValue::Number(MAX_SAFE_INTEGER)
        );
        assert_eq!(
            hex_to_decimal("0x20000000000000").unwrap(),
            DecimalValue::Text("9007199254740992".into())
        );
    }

    #[test]
    fn very_wide_integers_are_exact() {
        let max_u256 = format!("0x{}", "f".repeat(64));
        assert_eq!(
            hex_to_decimal(&max_u256).unwrap().to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn decimal_to_hex_accepts_integers() {
        assert_eq!(decimal_to_hex(0u64).unwrap(), "0x0");
        assert_eq!(decimal_to_hex(255u64).unwrap(), "0xff");
        assert_eq!(decimal_to_hex("21000").unwrap(), "0x5208");
        assert_eq!(decimal_to_hex("1.000").unwrap(), "0x1");
        assert_eq!(decimal_to_hex(ten_pow(30)).unwrap(), to_wire(&ten_pow(30)));
    }

    #[test]
    fn decimal_to_hex_rejects_fractions() {
        assert!(matches!(
            decimal_to_hex("1.5"),
            Err(GatewayError::InvalidNumber { .. })
        ));
        assert!(matches!(
            decimal_to_hex("abc"),
            Err(GatewayError::InvalidNumber { .. })
        ));
        assert!(matches!(
            decimal_to_hex("-1"),
            Err(GatewayError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn parse_scaled_units_whole_and_fractional() {
        assert_eq!(parse_scaled_units(1u64, 18).unwrap(), to_wire(&ten_pow(18)));
        assert_eq!(parse_scaled_units("1", 18).unwrap(), "0xde0b6b3a7640000");
        assert_eq!(
            parse_scaled_units("1.5", 18).unwrap(),
            to_wire(&(ten_pow(17) * 15u32))
        );
        assert_eq!(parse_scaled_units("0.000001", 6).unwrap(), "0x1");
        assert_eq!(parse_scaled_units(".5", 1).unwrap(), "0x5");
    }

    #[test]
    fn parse_scaled_units_refuses_lossy_input() {
        let err = parse_scaled_units("1.0000000000000000001", 18).unwrap_err();
        assert!(matches!(err, GatewayError::OverflowPrecision { scale: 18, .. }));
        assert!(parse_scaled_units("0.1", 0).is_err());
    }

    #[test]
    fn trailing_fraction_zeros_are_not_precision() {
        assert_eq!(
            parse_scaled_units("1.50000000000000000000000", 18).unwrap(),
            parse_scaled_units("1.5", 18).unwrap()
        );
    }

    #[test]
    fn scientific_notation_is_exact() {
        assert_eq!(parse_scaled_units("1e18", 0).unwrap(), to_wire(&ten_pow(18)));
        assert_eq!(parse_scaled_units("2.5e-3", 4).unwrap(), "0x19");
        assert!(parse_scaled_units("2.5e-3", 3).is_err());
        assert!(decimal_to_hex("1500e-3").unwrap_err().is_caller_error());
        assert_eq!(parse_scaled_units("1500e-3", 1).unwrap(), "0xf");
    }

    #[test]
    fn json_numbers_convert_through_their_text() {
        let n = Numeric::try_from(&serde_json::json!(1.25)).unwrap();
        assert_eq!(parse_scaled_units(n, 2).unwrap(), "0x7d");
        assert!(Numeric::try_from(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn format_scaled_units_renders_whole_units() {
        assert_eq!(format_scaled_units("0xde0b6b3a7640000", 18).unwrap(), "1");
        assert_eq!(format_scaled_units("0x0", 18).unwrap(), "0");
        assert_eq!(format_scaled_units("0x", 18).unwrap(), "0");
        assert_eq!(format_scaled_units("0x1", 18).unwrap(), "0.000000000000000001");
        assert_eq!(format_base_units(&BigUint::from(1_500_000u32), 6), "1.5");
        assert_eq!(format_base_units(&BigUint::from(1234u32), 0), "1234");
    }

    #[test]
    fn round_trip_through_scale() {
        let cases = [
            ("0", 18),
            ("1", 18),
            ("1.5", 18),
            ("123456789.000000000000000001", 18),
            ("0.000001", 6),
            ("42", 0),
            ("340282366920938463463374607431768211456.25", 2),
        ];
        for (value, scale) in cases {
            let wire = parse_scaled_units(value, scale).unwrap();
            assert_eq!(format_scaled_units(&wire, scale).unwrap(), value, "scale {scale}");
        }
    }

    #[test]
    fn long_hex_shape() {
        let address = format!("0x{}", "0".repeat(39) + "1");
        assert!(is_long_hex(&address));
        assert!(!is_long_hex("0xde0b6b3a7640000"));
        assert!(!is_long_hex(&"0".repeat(64)));
        assert!(is_wire_value("0x"));
        assert!(!is_wire_value("latest"));
    }
}
