//! Event normalization boundary.
//!
//! Raw rows from the bot API are `serde_json::Value`s with no schema
//! guarantees: fields go missing, numbers arrive as strings, whole rows
//! can be something other than an object. Everything dynamic is coerced
//! here, once, into the typed events the rest of the pipeline consumes.
//!
//! Two rules hold for every field:
//! - a missing or malformed value becomes `None`, never a default like 0;
//! - a malformed row is passed through with nulled fields, never dropped,
//!   so partial data stays visible to the operator.

use recon_common::{
    parse_inventory, parse_number, parse_timestamp_ms, DecisionEvent, FillLegEvent, TradeLegEvent,
};
use serde_json::Value;

/// Extract a non-empty string field.
fn opt_string(row: &Value, key: &str) -> Option<String> {
    let s = row.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Extract a raw JSON field, treating explicit null as absent.
fn opt_raw(row: &Value, key: &str) -> Option<Value> {
    match row.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.clone()),
    }
}

/// Normalize a raw decision row.
pub fn normalize_decision(row: &Value) -> DecisionEvent {
    let reason = opt_string(row, "reason");
    let direction = opt_string(row, "direction");

    // The explanation defaults to "{direction} {reason}" when the row
    // omits it; an all-empty result stays None.
    let dir_expl = opt_string(row, "dir_expl").or_else(|| {
        let composed = format!(
            "{} {}",
            direction.as_deref().unwrap_or(""),
            reason.as_deref().unwrap_or("")
        );
        let composed = composed.trim();
        if composed.is_empty() {
            None
        } else {
            Some(composed.to_string())
        }
    });

    DecisionEvent {
        trace_id: opt_string(row, "trace"),
        timestamp: row.get("ts").and_then(parse_timestamp_ms),
        reason,
        direction,
        dir_expl,
        spread_signal: row.get("spread_signal").and_then(parse_number),
        inventory_before: row.get("inventory_before").and_then(parse_inventory),
        inventory_after: row.get("inventory_after").and_then(parse_inventory),
    }
}

/// Normalize a raw order-attempt row.
pub fn normalize_trade(row: &Value) -> TradeLegEvent {
    TradeLegEvent {
        trace_id: opt_string(row, "trace"),
        timestamp: row.get("ts").and_then(parse_timestamp_ms),
        venue: opt_string(row, "venue"),
        size: row.get("size").and_then(parse_number),
        ob_price: row.get("ob_price").and_then(parse_number),
        exec_price: row.get("exec_price").and_then(parse_number),
        latency_ms: row.get("latency_ms").and_then(parse_number),
        status: opt_string(row, "status"),
        payload: opt_raw(row, "payload"),
        response: opt_raw(row, "response"),
    }
}

/// Normalize a raw fill row.
pub fn normalize_fill(row: &Value) -> FillLegEvent {
    FillLegEvent {
        trace_id: opt_string(row, "trace"),
        timestamp: row.get("ts").and_then(parse_timestamp_ms),
        venue: opt_string(row, "venue"),
        base_amount: row.get("base_amount").and_then(parse_number),
        fill_price: row.get("fill_price").and_then(parse_number),
        fill_latency_ms: row.get("fill_latency_ms").and_then(parse_number),
    }
}

/// Normalize a batch of raw rows.
pub fn normalize_decisions(rows: &[Value]) -> Vec<DecisionEvent> {
    rows.iter().map(normalize_decision).collect()
}

pub fn normalize_trades(rows: &[Value]) -> Vec<TradeLegEvent> {
    rows.iter().map(normalize_trade).collect()
}

pub fn normalize_fills(rows: &[Value]) -> Vec<FillLegEvent> {
    rows.iter().map(normalize_fill).collect()
}
