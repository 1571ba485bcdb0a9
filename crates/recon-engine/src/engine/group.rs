//! Leg grouping: trace → venue → merged leg.
//!
//! Trade and fill rows that share a trace id are folded into per-venue
//! [`MergedLeg`]s. Decision rows attach their metadata to the trace they
//! reference. Ordering matters downstream (the pairer and the signless
//! classifier fallback both depend on it), so groups keep first-sighting
//! order of traces, and legs keep first-sighting order of venues.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use recon_common::{DecisionEvent, FillLegEvent, InventoryEntry, MergedLeg, TradeLegEvent};
use rust_decimal::Decimal;

/// Decision metadata carried by a trace group.
///
/// Fields fill on first sighting and are never overwritten: a later row
/// cannot replace a set value, with null or otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionMeta {
    pub reason: Option<String>,
    pub direction: Option<String>,
    pub dir_expl: Option<String>,
    pub spread_signal: Option<Decimal>,
    pub inventory_before: Option<Vec<InventoryEntry>>,
    pub inventory_after: Option<Vec<InventoryEntry>>,
}

impl DecisionMeta {
    /// Fill unset fields from a decision event.
    fn absorb(&mut self, decision: &DecisionEvent) {
        if self.reason.is_none() {
            self.reason = decision.reason.clone();
        }
        if self.direction.is_none() {
            self.direction = decision.direction.clone();
        }
        if self.dir_expl.is_none() {
            self.dir_expl = decision.dir_expl.clone();
        }
        if self.spread_signal.is_none() {
            self.spread_signal = decision.spread_signal;
        }
        if self.inventory_before.is_none() {
            self.inventory_before = decision.inventory_before.clone();
        }
        if self.inventory_after.is_none() {
            self.inventory_after = decision.inventory_after.clone();
        }
    }

    /// Fill unset fields from another meta (used when pairing merges two
    /// traces; the earlier trace's values win).
    pub(crate) fn absorb_meta(&mut self, other: DecisionMeta) {
        if self.reason.is_none() {
            self.reason = other.reason;
        }
        if self.direction.is_none() {
            self.direction = other.direction;
        }
        if self.dir_expl.is_none() {
            self.dir_expl = other.dir_expl;
        }
        if self.spread_signal.is_none() {
            self.spread_signal = other.spread_signal;
        }
        if self.inventory_before.is_none() {
            self.inventory_before = other.inventory_before;
        }
        if self.inventory_after.is_none() {
            self.inventory_after = other.inventory_after;
        }
    }
}

/// All rows of one trace, merged.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceGroup {
    pub trace_id: String,
    /// Earliest timestamp seen across the trace's decision, trade and
    /// fill rows.
    pub timestamp: Option<DateTime<Utc>>,
    pub meta: DecisionMeta,
    /// Per-venue legs in venue first-sighting order.
    pub legs: Vec<MergedLeg>,
}

impl TraceGroup {
    fn new(trace_id: String) -> Self {
        Self {
            trace_id,
            timestamp: None,
            meta: DecisionMeta::default(),
            legs: Vec::new(),
        }
    }

    fn observe_timestamp(&mut self, ts: Option<DateTime<Utc>>) {
        if let Some(ts) = ts {
            self.timestamp = Some(match self.timestamp {
                Some(existing) => existing.min(ts),
                None => ts,
            });
        }
    }

    /// Find or append the leg for a venue.
    fn leg_mut(&mut self, venue: &str) -> &mut MergedLeg {
        if let Some(idx) = self.legs.iter().position(|leg| leg.venue == venue) {
            return &mut self.legs[idx];
        }
        self.legs.push(MergedLeg::empty(venue));
        // Just pushed, so the last slot exists.
        let last = self.legs.len() - 1;
        &mut self.legs[last]
    }
}

/// Ordered collection of trace groups with O(1) lookup.
struct GroupIndex {
    groups: Vec<TraceGroup>,
    by_trace: HashMap<String, usize>,
}

impl GroupIndex {
    fn new() -> Self {
        Self {
            groups: Vec::new(),
            by_trace: HashMap::new(),
        }
    }

    fn get_or_create(&mut self, trace_id: &str) -> &mut TraceGroup {
        if let Some(&idx) = self.by_trace.get(trace_id) {
            return &mut self.groups[idx];
        }
        self.by_trace
            .insert(trace_id.to_string(), self.groups.len());
        self.groups.push(TraceGroup::new(trace_id.to_string()));
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn get_existing(&mut self, trace_id: &str) -> Option<&mut TraceGroup> {
        let idx = *self.by_trace.get(trace_id)?;
        Some(&mut self.groups[idx])
    }
}

/// Group trade and fill rows by trace and venue, then attach decision
/// metadata.
///
/// Rows with a missing trace id or venue key under `""` so they remain
/// visible instead of being dropped. Groups are created by trade/fill
/// rows only; a decision whose trace has no order activity attaches to
/// nothing and produces no record.
pub fn group_legs(
    decisions: &[DecisionEvent],
    trades: &[TradeLegEvent],
    fills: &[FillLegEvent],
) -> Vec<TraceGroup> {
    let mut index = GroupIndex::new();

    for trade in trades {
        let trace = trade.trace_id.as_deref().unwrap_or("");
        let group = index.get_or_create(trace);
        group.observe_timestamp(trade.timestamp);

        let leg = group.leg_mut(trade.venue.as_deref().unwrap_or(""));
        // First sighting wins per field, matching the decision-metadata
        // rule; in practice there is one trade row per (trace, venue).
        if leg.size.is_none() {
            leg.size = trade.size;
        }
        if leg.ob_price.is_none() {
            leg.ob_price = trade.ob_price;
        }
        if leg.exec_price.is_none() {
            leg.exec_price = trade.exec_price;
        }
        if leg.latency_ms.is_none() {
            leg.latency_ms = trade.latency_ms;
        }
        if leg.status.is_none() {
            leg.status = trade.status.clone();
        }
        if leg.payload.is_none() {
            leg.payload = trade.payload.clone();
        }
        if leg.response.is_none() {
            leg.response = trade.response.clone();
        }
    }

    for fill in fills {
        let trace = fill.trace_id.as_deref().unwrap_or("");
        let group = index.get_or_create(trace);
        group.observe_timestamp(fill.timestamp);

        let leg = group.leg_mut(fill.venue.as_deref().unwrap_or(""));
        if leg.fill_price.is_none() {
            leg.fill_price = fill.fill_price;
        }
        if leg.fill_latency_ms.is_none() {
            leg.fill_latency_ms = fill.fill_latency_ms;
        }
        // The trade row's size wins; the fill amount only stands in when
        // no trade row carried one.
        if leg.size.is_none() {
            leg.size = fill.base_amount;
        }
    }

    for decision in decisions {
        let trace = decision.trace_id.as_deref().unwrap_or("");
        if let Some(group) = index.get_existing(trace) {
            group.observe_timestamp(decision.timestamp);
            group.meta.absorb(decision);
        }
    }

    index.groups
}
