//! Reconciled record assembly.

use std::cmp::Ordering;

use recon_common::CombinedTradeRecord;

use super::classify::classify_legs;
use super::group::TraceGroup;

/// Project trace groups into operator-facing records, newest first.
///
/// The sort is stable and equal timestamps keep their input order -
/// a non-stable sort makes equal-timestamp rows jitter between polls in
/// the review UI. Records without a timestamp sort after all timestamped
/// ones.
pub fn build_records(groups: Vec<TraceGroup>) -> Vec<CombinedTradeRecord> {
    let mut records: Vec<CombinedTradeRecord> = groups.into_iter().map(build_record).collect();

    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    records
}

fn build_record(group: TraceGroup) -> CombinedTradeRecord {
    let (long_leg, short_leg) = classify_legs(&group.legs);

    CombinedTradeRecord {
        trace_id: group.trace_id,
        timestamp: group.timestamp,
        reason: group.meta.reason,
        direction: group.meta.direction,
        dir_expl: group.meta.dir_expl,
        spread_signal: group.meta.spread_signal,
        inventory_before: group.meta.inventory_before,
        inventory_after: group.meta.inventory_after,
        long_leg,
        short_leg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::group::DecisionMeta;
    use chrono::{DateTime, TimeZone, Utc};
    use recon_common::MergedLeg;
    use rust_decimal_macros::dec;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    fn group(trace: &str, at: Option<i64>) -> TraceGroup {
        let mut leg = MergedLeg::empty("L");
        leg.size = Some(dec!(1));
        TraceGroup {
            trace_id: trace.to_string(),
            timestamp: at.map(ts),
            meta: DecisionMeta::default(),
            legs: vec![leg],
        }
    }

    #[test]
    fn test_sorted_newest_first() {
        let records = build_records(vec![
            group("old", Some(1_000)),
            group("new", Some(3_000)),
            group("mid", Some(2_000)),
        ]);
        let ids: Vec<&str> = records.iter().map(|r| r.trace_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let records = build_records(vec![
            group("first", Some(1_000)),
            group("second", Some(1_000)),
            group("third", Some(1_000)),
        ]);
        let ids: Vec<&str> = records.iter().map(|r| r.trace_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_untimestamped_records_sort_last() {
        let records = build_records(vec![
            group("floating", None),
            group("timed", Some(1_000)),
        ]);
        let ids: Vec<&str> = records.iter().map(|r| r.trace_id.as_str()).collect();
        assert_eq!(ids, vec!["timed", "floating"]);
    }

    #[test]
    fn test_record_carries_meta_and_legs() {
        let mut g = group("t1", Some(1_000));
        g.meta.reason = Some("spread_open".to_string());
        g.meta.spread_signal = Some(dec!(0.8));

        let records = build_records(vec![g]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason.as_deref(), Some("spread_open"));
        assert_eq!(records[0].spread_signal, Some(dec!(0.8)));
        assert_eq!(records[0].long_leg.as_ref().unwrap().venue, "L");
        assert!(records[0].short_leg.is_none());
    }
}
