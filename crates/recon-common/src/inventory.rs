//! Dual-format inventory snapshot parsing.
//!
//! The bot has logged inventory in two encodings over its lifetime:
//!
//! - current: a JSON array of `{venue, qty, price}` objects (either a real
//!   JSON array or that array serialized into a string field);
//! - legacy: a pipe-delimited display string, e.g.
//!   `"L Qty:1.5 Price:100.2 | E Qty:-1.5 Price:101"`.
//!
//! [`parse_inventory`] handles both. The return type distinguishes
//! "no data" (`None`) from "flat position" (`Some(vec![])`) - an
//! empty-but-present list means the bot reported holding nothing, which
//! is information, not absence.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::num::{parse_number, parse_number_str};
use crate::types::InventoryEntry;

/// Leading venue token of a legacy segment: starts with a letter.
static VENUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_-]*)").expect("valid venue regex"));

static QTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Qty:\s*(-?\d+(?:\.\d+)?)").expect("valid qty regex"));

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Price:\s*(-?\d+(?:\.\d+)?)").expect("valid price regex"));

/// Parse an inventory snapshot field in either encoding.
///
/// Returns `None` for null/empty/unparseable input, `Some(entries)` once
/// either branch recognizes the value - including `Some(vec![])` for an
/// empty-but-present JSON array.
pub fn parse_inventory(raw: &Value) -> Option<Vec<InventoryEntry>> {
    match raw {
        Value::Array(arr) => Some(entries_from_array(arr)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            // Strict JSON first; only arrays count. Anything else drops
            // through to the legacy text format.
            if let Ok(Value::Array(arr)) = serde_json::from_str::<Value>(trimmed) {
                return Some(entries_from_array(&arr));
            }
            parse_legacy_text(trimmed)
        }
        _ => None,
    }
}

/// Map a JSON array to entries, dropping elements without a resolvable
/// venue string. Quantity and price coerce softly; unresolved numerics
/// stay `None`, not zero.
fn entries_from_array(arr: &[Value]) -> Vec<InventoryEntry> {
    arr.iter()
        .filter_map(|item| {
            let venue = item.get("venue")?.as_str()?.trim();
            if venue.is_empty() {
                return None;
            }
            let qty = item.get("qty").and_then(parse_number);
            let price = item.get("price").and_then(parse_number);
            Some(InventoryEntry::new(venue, qty, price))
        })
        .collect()
}

/// Parse the legacy pipe-delimited display format.
///
/// A segment only yields an entry when it carries a venue token and at
/// least one `Qty:`/`Price:` marker - a bare word is noise, not a
/// position line. Returns `None` when no segment qualifies.
fn parse_legacy_text(text: &str) -> Option<Vec<InventoryEntry>> {
    let entries: Vec<InventoryEntry> = text
        .split('|')
        .filter_map(|segment| {
            let venue = VENUE_RE.captures(segment)?.get(1)?.as_str();
            if !segment.contains("Qty:") && !segment.contains("Price:") {
                return None;
            }
            let qty = QTY_RE
                .captures(segment)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_number_str(m.as_str()));
            let price = PRICE_RE
                .captures(segment)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_number_str(m.as_str()));
            Some(InventoryEntry::new(venue, qty, price))
        })
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

/// Spread delta between two opposite-direction position lines, in percent.
///
/// Defined only when both quantities resolve with opposite, non-zero
/// signs and the reference-side price is non-zero:
///
/// - `long.qty > 0`, `short.qty < 0` => `(short.price - long.price) / long.price * 100`
/// - `long.qty < 0`, `short.qty > 0` => `(long.price - short.price) / short.price * 100`
///
/// Any other sign combination is `None`.
pub fn compute_spread_delta(long: &InventoryEntry, short: &InventoryEntry) -> Option<Decimal> {
    let long_qty = long.qty?;
    let short_qty = short.qty?;
    let hundred = Decimal::ONE_HUNDRED;

    if long_qty > Decimal::ZERO && short_qty < Decimal::ZERO {
        let reference = long.price?;
        if reference.is_zero() {
            return None;
        }
        Some((short.price? - reference) / reference * hundred)
    } else if long_qty < Decimal::ZERO && short_qty > Decimal::ZERO {
        let reference = short.price?;
        if reference.is_zero() {
            return None;
        }
        Some((long.price? - reference) / reference * hundred)
    } else {
        None
    }
}
