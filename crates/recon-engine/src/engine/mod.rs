//! The trade reconciliation engine.
//!
//! Fuses three independently-polled event streams - decisions, per-venue
//! order attempts, and per-venue fills - into cross-venue trade records:
//!
//! ```text
//! decisions ─┐
//! trades ────┼─► group ─► pair ─► classify ─► build ─► records
//! fills ─────┘
//! ```
//!
//! [`reconcile`] is a pure function: each call is a full, stateless
//! rebuild over an isolated input snapshot. Callers keep their own
//! last-good result between successful computations (see the poller's
//! `SnapshotStore`).

pub mod build;
pub mod classify;
pub mod group;
pub mod pair;

use recon_common::{CombinedTradeRecord, DecisionEvent, FillLegEvent, TradeLegEvent};

pub use classify::leg_slippage;

/// Reconcile the three event streams into review records.
///
/// Output is sorted by timestamp descending; the sort is stable so equal
/// timestamps preserve input order, which keeps repeated invocations
/// byte-identical for identical input.
pub fn reconcile(
    decisions: &[DecisionEvent],
    trades: &[TradeLegEvent],
    fills: &[FillLegEvent],
) -> Vec<CombinedTradeRecord> {
    let groups = group::group_legs(decisions, trades, fills);
    let paired = pair::pair_single_legs(groups);
    build::build_records(paired)
}
