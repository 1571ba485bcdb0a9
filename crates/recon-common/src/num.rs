//! Soft numeric coercion for dynamic JSON fields.
//!
//! The bot API rows come back as loosely-typed JSON: numbers, numeric
//! strings, nulls, or garbage, depending on which code path logged them.
//! Everything funnels through [`parse_number`], which resolves to `None`
//! on anything it cannot represent exactly - it never errors and never
//! substitutes zero.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;

/// Coerce a dynamic JSON value to a `Decimal`.
///
/// Accepts JSON numbers and numeric strings (plain or scientific
/// notation). Non-finite floats, out-of-range magnitudes and anything
/// non-numeric resolve to `None`.
pub fn parse_number(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from_i64(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from_u64(u)
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

/// Coerce a string to a `Decimal`, tolerating scientific notation.
pub fn parse_number_str(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Coerce a dynamic JSON value to a UTC timestamp.
///
/// The wire format is epoch milliseconds (number or numeric string);
/// RFC 3339 strings are accepted as a fallback. Unresolvable values are
/// `None`.
pub fn parse_timestamp_ms(raw: &Value) -> Option<DateTime<Utc>> {
    if let Some(ms) = parse_number(raw).and_then(|d| d.to_i64()) {
        return Utc.timestamp_millis_opt(ms).single();
    }
    if let Value::String(s) = raw {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_number_from_json_number() {
        assert_eq!(parse_number(&json!(42)), Some(dec!(42)));
        assert_eq!(parse_number(&json!(-0.015)), Some(dec!(-0.015)));
        assert_eq!(parse_number(&json!(u64::MAX)), Decimal::from_u64(u64::MAX));
    }

    #[test]
    fn test_parse_number_from_string() {
        assert_eq!(parse_number(&json!("101.25")), Some(dec!(101.25)));
        assert_eq!(parse_number(&json!("  -3 ")), Some(dec!(-3)));
        assert_eq!(parse_number(&json!("1.5e3")), Some(dec!(1500)));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(&json!("garbage")), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("Infinity")), None);
        assert_eq!(parse_number(&json!("")), None);
        assert_eq!(parse_number(&Value::Null), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!({"x": 1})), None);
    }

    #[test]
    fn test_parse_number_never_zero_for_missing() {
        // Absent data must stay distinguishable from a real zero.
        assert_eq!(parse_number(&Value::Null), None);
        assert_eq!(parse_number(&json!(0)), Some(Decimal::ZERO));
    }

    #[test]
    fn test_parse_timestamp_epoch_millis() {
        let ts = parse_timestamp_ms(&json!(1_700_000_000_000_i64)).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);

        let ts = parse_timestamp_ms(&json!("1700000000000")).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_timestamp_rfc3339_fallback() {
        let ts = parse_timestamp_ms(&json!("2025-01-01T12:00:00Z")).unwrap();
        assert_eq!(ts.timestamp(), 1_735_732_800);
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert_eq!(parse_timestamp_ms(&json!("soon")), None);
        assert_eq!(parse_timestamp_ms(&Value::Null), None);
    }
}
