//! Single-leg pairing.
//!
//! A cross-venue trade sometimes surfaces as two unrelated traces - one
//! per venue-side order attempt - because the bot issued the legs through
//! independent code paths that never shared a correlation id. This module
//! stitches such traces back together heuristically: opposite signed
//! sizes, timestamps within a fixed window, first match wins.
//!
//! This is a greedy approximation, not a global matching. Under bursts of
//! concurrent single-leg traffic it can pair the wrong traces; ties
//! resolve by input order. That limitation is intentional and mirrors how
//! the records were produced - do not "fix" it here without confirming
//! the intended behavior upstream.

use rust_decimal::Decimal;

use super::group::TraceGroup;

/// Maximum timestamp distance for two single-leg traces to pair.
const PAIR_WINDOW_MS: i64 = 2_000;

/// Pair opposite-direction single-leg traces within the time window.
///
/// Groups with two or more legs, and singles that find no partner, pass
/// through unchanged. A merged group gets the synthetic id `"A+B"`, the
/// earlier of the two timestamps, the union of the legs (A's first), and
/// decision metadata merged with A's values winning.
pub fn pair_single_legs(groups: Vec<TraceGroup>) -> Vec<TraceGroup> {
    let mut slots: Vec<Option<TraceGroup>> = groups.into_iter().map(Some).collect();
    let len = slots.len();

    for i in 0..len {
        let Some(candidate) = pairing_key(slots[i].as_ref()) else {
            continue;
        };

        let mut partner: Option<usize> = None;
        for (j, slot) in slots.iter().enumerate().skip(i + 1) {
            let Some(other) = pairing_key(slot.as_ref()) else {
                continue;
            };
            // Opposite, non-zero signs only.
            if (candidate.size > Decimal::ZERO) == (other.size > Decimal::ZERO) {
                continue;
            }
            if (candidate.ts_ms - other.ts_ms).abs() > PAIR_WINDOW_MS {
                continue;
            }
            partner = Some(j);
            break;
        }

        if let Some(j) = partner {
            if let (Some(a), Some(b)) = (slots[i].take(), slots[j].take()) {
                slots[i] = Some(merge_pair(a, b));
            }
        }
    }

    slots.into_iter().flatten().collect()
}

/// Size and timestamp of a group that is eligible for pairing: exactly
/// one leg, a resolved non-zero size, and a timestamp to window against.
struct PairingKey {
    size: Decimal,
    ts_ms: i64,
}

fn pairing_key(group: Option<&TraceGroup>) -> Option<PairingKey> {
    let group = group?;
    if group.legs.len() != 1 {
        return None;
    }
    let size = group.legs[0].size?;
    if size.is_zero() {
        return None;
    }
    let ts_ms = group.timestamp?.timestamp_millis();
    Some(PairingKey { size, ts_ms })
}

fn merge_pair(a: TraceGroup, b: TraceGroup) -> TraceGroup {
    let mut meta = a.meta;
    meta.absorb_meta(b.meta);

    let timestamp = match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    };

    let mut legs = a.legs;
    legs.extend(b.legs);

    TraceGroup {
        trace_id: format!("{}+{}", a.trace_id, b.trace_id),
        timestamp,
        meta,
        legs,
    }
}
