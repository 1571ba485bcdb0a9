//! Long/short role assignment and per-leg slippage.

use recon_common::MergedLeg;
use rust_decimal::Decimal;

/// Assign long/short roles to a group's legs.
///
/// The first leg with a positive size is the long leg, the first with a
/// negative size the short leg. When no leg carries a definite sign
/// (legacy signless rows), the fallback takes the first leg in group
/// order as long and the second, if any, as short. Legs beyond the first
/// long/short are not part of the projection.
///
/// Slippage is computed on the way out; source legs are not mutated.
pub fn classify_legs(legs: &[MergedLeg]) -> (Option<MergedLeg>, Option<MergedLeg>) {
    let mut long_idx: Option<usize> = None;
    let mut short_idx: Option<usize> = None;

    for (idx, leg) in legs.iter().enumerate() {
        match leg.size {
            Some(size) if size > Decimal::ZERO => {
                if long_idx.is_none() {
                    long_idx = Some(idx);
                }
            }
            Some(size) if size < Decimal::ZERO => {
                if short_idx.is_none() {
                    short_idx = Some(idx);
                }
            }
            _ => {}
        }
    }

    // Legacy rows predating signed sizes: positional fallback.
    if long_idx.is_none() && short_idx.is_none() {
        long_idx = (!legs.is_empty()).then_some(0);
        short_idx = (legs.len() > 1).then_some(1);
    }

    let long = long_idx.map(|idx| with_slippage(&legs[idx], true));
    let short = short_idx.map(|idx| with_slippage(&legs[idx], false));
    (long, short)
}

fn with_slippage(leg: &MergedLeg, is_long: bool) -> MergedLeg {
    let mut leg = leg.clone();
    leg.slippage_pct = leg_slippage(&leg, is_long);
    leg
}

/// Per-leg slippage in percent, sign-adjusted for direction.
///
/// Requires both `fill_price` and a non-zero `ob_price`; anything missing
/// yields `None`, never 0.
///
/// - long: `(fill_price - ob_price) / ob_price * 100`
/// - short: `(ob_price - fill_price) / ob_price * 100`
pub fn leg_slippage(leg: &MergedLeg, is_long: bool) -> Option<Decimal> {
    let fill = leg.fill_price?;
    let ob = leg.ob_price?;
    if ob.is_zero() {
        return None;
    }
    let raw = (fill - ob) / ob * Decimal::ONE_HUNDRED;
    Some(if is_long { raw } else { -raw })
}
