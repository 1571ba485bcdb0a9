//! Integration tests for the full reconciliation pipeline.
//!
//! These tests drive raw JSON rows through normalization and
//! reconciliation, the same path the poller takes, and verify the
//! operator-facing records that come out.

use rust_decimal_macros::dec;
use serde_json::{json, Value};

use recon_engine::normalize::{normalize_decisions, normalize_fills, normalize_trades};
use recon_engine::reconcile;
use recon_common::CombinedTradeRecord;

const T0: i64 = 1_700_000_000_000;

fn run(decisions: Vec<Value>, trades: Vec<Value>, fills: Vec<Value>) -> Vec<CombinedTradeRecord> {
    let decisions = normalize_decisions(&decisions);
    let trades = normalize_trades(&trades);
    let fills = normalize_fills(&fills);
    reconcile(&decisions, &trades, &fills)
}

#[test]
fn scenario_a_single_leg_with_fill() {
    let trades = vec![json!({"trace": "t1", "venue": "L", "size": 0.01, "ts": T0})];
    let fills = vec![json!({
        "trace": "t1", "venue": "L", "fill_price": 100, "base_amount": 0.01, "ts": T0
    })];

    let records = run(vec![], trades, fills);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.trace_id, "t1");
    let long = record.long_leg.as_ref().expect("long leg");
    assert_eq!(long.venue, "L");
    assert_eq!(long.size, Some(dec!(0.01)));
    assert_eq!(long.fill_price, Some(dec!(100)));
    assert!(record.short_leg.is_none());
}

#[test]
fn scenario_b_opposite_singles_merge() {
    let trades = vec![
        json!({"trace": "a", "venue": "L", "size": 0.01, "ts": T0}),
        json!({"trace": "b", "venue": "E", "size": -0.01, "ts": T0 + 1_000}),
    ];

    let records = run(vec![], trades, vec![]);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.trace_id, "a+b");
    // The merged record carries the earlier constituent's timestamp.
    assert_eq!(
        record.timestamp.map(|ts| ts.timestamp_millis()),
        Some(T0)
    );
    assert_eq!(record.long_leg.as_ref().map(|l| l.venue.as_str()), Some("L"));
    assert_eq!(record.short_leg.as_ref().map(|l| l.venue.as_str()), Some("E"));
}

#[test]
fn pairing_window_close_timestamps_merge() {
    let trades = vec![
        json!({"trace": "a", "venue": "L", "size": 1, "ts": T0}),
        json!({"trace": "b", "venue": "E", "size": -1, "ts": T0 + 500}),
    ];
    let records = run(vec![], trades, vec![]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trace_id, "a+b");
}

#[test]
fn pairing_window_distant_timestamps_stay_separate() {
    let trades = vec![
        json!({"trace": "a", "venue": "L", "size": 1, "ts": T0}),
        json!({"trace": "b", "venue": "E", "size": -1, "ts": T0 + 3_000}),
    ];
    let records = run(vec![], trades, vec![]);
    assert_eq!(records.len(), 2);
    // Sorted newest first.
    assert_eq!(records[0].trace_id, "b");
    assert_eq!(records[1].trace_id, "a");
}

#[test]
fn unpairable_single_leg_stays_visible() {
    let trades = vec![json!({"trace": "lonely", "venue": "E", "size": -0.5, "ts": T0})];
    let records = run(vec![], trades, vec![]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trace_id, "lonely");
    assert!(records[0].long_leg.is_none());
    assert_eq!(
        records[0].short_leg.as_ref().map(|l| l.venue.as_str()),
        Some("E")
    );
}

#[test]
fn merged_fill_price_always_comes_from_the_fill_row() {
    // Several traces and venues; each merged leg must carry its own
    // fill row's price.
    let trades = vec![
        json!({"trace": "t1", "venue": "L", "size": 1, "ts": T0}),
        json!({"trace": "t1", "venue": "E", "size": -1, "ts": T0}),
        json!({"trace": "t2", "venue": "L", "size": 2, "ts": T0 + 10_000}),
    ];
    let fills = vec![
        json!({"trace": "t1", "venue": "L", "fill_price": 100.25, "base_amount": 1, "ts": T0}),
        json!({"trace": "t1", "venue": "E", "fill_price": 101.5, "base_amount": 1, "ts": T0}),
        json!({"trace": "t2", "venue": "L", "fill_price": 99.0, "base_amount": 2, "ts": T0 + 10_000}),
    ];

    let records = run(vec![], trades, fills);
    assert_eq!(records.len(), 2);

    let t1 = records.iter().find(|r| r.trace_id == "t1").expect("t1");
    assert_eq!(t1.long_leg.as_ref().unwrap().fill_price, Some(dec!(100.25)));
    assert_eq!(t1.short_leg.as_ref().unwrap().fill_price, Some(dec!(101.5)));

    let t2 = records.iter().find(|r| r.trace_id == "t2").expect("t2");
    assert_eq!(t2.long_leg.as_ref().unwrap().fill_price, Some(dec!(99.0)));
}

#[test]
fn reconcile_is_idempotent_including_tie_order() {
    let trades = vec![
        json!({"trace": "x", "venue": "L", "size": 1, "ts": T0}),
        json!({"trace": "y", "venue": "E", "size": 2, "ts": T0}),
        json!({"trace": "z", "venue": "L", "size": 3, "ts": T0}),
    ];

    let first = run(vec![], trades.clone(), vec![]);
    let second = run(vec![], trades, vec![]);
    assert_eq!(first, second);

    // Same-sign traces never pair; ties keep input order.
    let ids: Vec<&str> = first.iter().map(|r| r.trace_id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[test]
fn decision_metadata_and_slippage_flow_through() {
    let decisions = vec![json!({
        "trace": "t1",
        "ts": T0 - 50,
        "reason": "spread_open",
        "direction": "long_l_short_e",
        "spread_signal": 0.85,
        "inventory_before": [
            {"venue": "L", "qty": 0, "price": 100},
            {"venue": "E", "qty": 0, "price": 101}
        ],
        "inventory_after": "L Qty:1 Price:100 | E Qty:-1 Price:101"
    })];
    let trades = vec![
        json!({"trace": "t1", "venue": "L", "size": 1, "ob_price": 100, "ts": T0, "status": "FILLED"}),
        json!({"trace": "t1", "venue": "E", "size": -1, "ob_price": 101, "ts": T0 + 20, "status": "FILLED"}),
    ];
    let fills = vec![
        json!({"trace": "t1", "venue": "L", "fill_price": 101, "base_amount": 1, "ts": T0 + 40}),
        json!({"trace": "t1", "venue": "E", "fill_price": 99.99, "base_amount": 1, "ts": T0 + 60}),
    ];

    let records = run(decisions, trades, fills);
    assert_eq!(records.len(), 1);
    let record = &records[0];

    // Decision metadata attached, dir_expl composed from the row fields.
    assert_eq!(record.reason.as_deref(), Some("spread_open"));
    assert_eq!(
        record.dir_expl.as_deref(),
        Some("long_l_short_e spread_open")
    );
    assert_eq!(record.spread_signal, Some(dec!(0.85)));
    // Decision row is the earliest constituent.
    assert_eq!(
        record.timestamp.map(|ts| ts.timestamp_millis()),
        Some(T0 - 50)
    );

    // Both inventory encodings decoded.
    let before = record.inventory_before.as_ref().expect("before");
    assert_eq!(before.len(), 2);
    let after = record.inventory_after.as_ref().expect("after");
    assert_eq!(after[1].qty, Some(dec!(-1)));

    // Long bought at 101 against a 100 book: +1% slippage. Short sold at
    // 99.99 against a 101 book: (101 - 99.99) / 101 * 100 = 1%.
    let long = record.long_leg.as_ref().expect("long");
    assert_eq!(long.slippage_pct, Some(dec!(1)));
    let short = record.short_leg.as_ref().expect("short");
    assert_eq!(short.slippage_pct, Some(dec!(1)));
}

#[test]
fn malformed_rows_surface_as_partial_records() {
    let trades = vec![
        json!({"venue": "L", "size": "not a number"}),
        json!("utter garbage"),
    ];

    let records = run(vec![], trades, vec![]);
    // Both rows key to the "" trace: one partial record, nothing dropped.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trace_id, "");
    let long = records[0].long_leg.as_ref().expect("fallback long");
    assert_eq!(long.size, None);
    assert_eq!(long.slippage_pct, None);
}

#[test]
fn missing_size_never_becomes_zero() {
    let trades = vec![json!({"trace": "t1", "venue": "L", "ts": T0})];
    let fills = vec![json!({"trace": "t1", "venue": "L", "fill_price": 100, "ts": T0})];

    let records = run(vec![], trades, fills);
    let long = records[0].long_leg.as_ref().expect("fallback long");
    assert_eq!(long.size, None);
}
