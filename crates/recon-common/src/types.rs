//! Shared types for the cross-venue trade reconciliation engine.
//!
//! CRITICAL: All prices, quantities and percentages use
//! `rust_decimal::Decimal`. NEVER use f64 for financial math.
//!
//! Every field the bot API can omit or garble is an `Option`. Absent data
//! stays `None` end to end - the engine never substitutes zero for a value
//! it did not receive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Data partition selector: live trading rows or test (paper) rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    #[default]
    Live,
    Test,
}

impl DataMode {
    /// Returns the query-parameter value for the bot API.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Live => "live",
            DataMode::Test => "test",
        }
    }
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(DataMode::Live),
            "test" | "paper" => Ok(DataMode::Test),
            _ => Err(format!("Unknown data mode: {}", s)),
        }
    }
}

/// One venue's position line inside an inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Venue name.
    pub venue: String,
    /// Signed position quantity (+long / -short). `None` when the source
    /// carried no resolvable number.
    pub qty: Option<Decimal>,
    /// Mark or entry price for the position.
    pub price: Option<Decimal>,
}

impl InventoryEntry {
    pub fn new(venue: impl Into<String>, qty: Option<Decimal>, price: Option<Decimal>) -> Self {
        Self {
            venue: venue.into(),
            qty,
            price,
        }
    }

    /// Notional value of the line: `|qty| * price`.
    ///
    /// `None` when either input is unresolved.
    pub fn value_usd(&self) -> Option<Decimal> {
        Some(self.qty?.abs() * self.price?)
    }
}

/// A strategy decision row, one per trade intent the bot logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Correlation id shared with the trade/fill legs of this intent.
    pub trace_id: Option<String>,
    /// When the decision was taken.
    pub timestamp: Option<DateTime<Utc>>,
    /// Why the bot acted (signal name, trigger description).
    pub reason: Option<String>,
    /// Direction label, e.g. "long_l_short_e".
    pub direction: Option<String>,
    /// Human-readable direction explanation. Defaulted to
    /// `"{direction} {reason}"` (trimmed) when the row omits it.
    pub dir_expl: Option<String>,
    /// Spread signal at decision time, in percent.
    pub spread_signal: Option<Decimal>,
    /// Inventory snapshot before the trade.
    pub inventory_before: Option<Vec<InventoryEntry>>,
    /// Inventory snapshot after the trade.
    pub inventory_after: Option<Vec<InventoryEntry>>,
}

/// A per-venue order attempt row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLegEvent {
    pub trace_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Venue the order was sent to.
    pub venue: Option<String>,
    /// Signed order size (+long / -short). Missing size stays `None`,
    /// never 0.
    pub size: Option<Decimal>,
    /// Top-of-book reference price captured when the order was placed.
    pub ob_price: Option<Decimal>,
    /// Price the order was submitted at.
    pub exec_price: Option<Decimal>,
    /// Order round-trip latency in milliseconds.
    pub latency_ms: Option<Decimal>,
    /// Venue order status string.
    pub status: Option<String>,
    /// Raw order payload as sent to the venue.
    pub payload: Option<Value>,
    /// Raw venue response.
    pub response: Option<Value>,
}

/// A per-venue fill row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillLegEvent {
    pub trace_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    /// Filled amount in base units (unsigned on the wire).
    pub base_amount: Option<Decimal>,
    /// Average fill price.
    pub fill_price: Option<Decimal>,
    /// Fill confirmation latency in milliseconds.
    pub fill_latency_ms: Option<Decimal>,
}

/// One venue-side leg of a reconciled trade: the merge of a trade row and
/// its fill row for the same (trace, venue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedLeg {
    pub venue: String,
    /// Signed size. The trade row's size wins over the fill row's
    /// `base_amount` when both exist.
    pub size: Option<Decimal>,
    pub ob_price: Option<Decimal>,
    pub exec_price: Option<Decimal>,
    pub latency_ms: Option<Decimal>,
    pub status: Option<String>,
    pub payload: Option<Value>,
    pub response: Option<Value>,
    pub fill_price: Option<Decimal>,
    pub fill_latency_ms: Option<Decimal>,
    /// Per-leg slippage in percent, sign-adjusted for direction.
    /// Computed by the classifier; `None` when inputs are missing.
    pub slippage_pct: Option<Decimal>,
}

impl MergedLeg {
    /// An empty leg for a venue, to be filled in by the grouper.
    pub fn empty(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            size: None,
            ob_price: None,
            exec_price: None,
            latency_ms: None,
            status: None,
            payload: None,
            response: None,
            fill_price: None,
            fill_latency_ms: None,
            slippage_pct: None,
        }
    }
}

/// A fully reconciled cross-venue trade, as shown to the operator.
///
/// Invariant: at most one long and one short leg. Legs are a derived
/// projection over the source rows - reconciliation never mutates events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedTradeRecord {
    /// Trace id, or the synthetic `"A+B"` form when two single-leg traces
    /// were heuristically paired.
    pub trace_id: String,
    /// Earliest timestamp across the record's constituent rows.
    pub timestamp: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub direction: Option<String>,
    pub dir_expl: Option<String>,
    pub spread_signal: Option<Decimal>,
    pub inventory_before: Option<Vec<InventoryEntry>>,
    pub inventory_after: Option<Vec<InventoryEntry>>,
    pub long_leg: Option<MergedLeg>,
    pub short_leg: Option<MergedLeg>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_data_mode_round_trip() {
        assert_eq!("live".parse::<DataMode>().unwrap(), DataMode::Live);
        assert_eq!("test".parse::<DataMode>().unwrap(), DataMode::Test);
        assert_eq!("paper".parse::<DataMode>().unwrap(), DataMode::Test);
        assert!("prod".parse::<DataMode>().is_err());
        assert_eq!(DataMode::Live.to_string(), "live");
    }

    #[test]
    fn test_inventory_entry_value_usd() {
        let entry = InventoryEntry::new("L", Some(dec!(-2)), Some(dec!(101.5)));
        assert_eq!(entry.value_usd(), Some(dec!(203.0)));
    }

    #[test]
    fn test_inventory_entry_value_usd_missing_input() {
        let entry = InventoryEntry::new("L", None, Some(dec!(101.5)));
        assert_eq!(entry.value_usd(), None);

        let entry = InventoryEntry::new("E", Some(dec!(1)), None);
        assert_eq!(entry.value_usd(), None);
    }

    #[test]
    fn test_merged_leg_empty() {
        let leg = MergedLeg::empty("E");
        assert_eq!(leg.venue, "E");
        assert!(leg.size.is_none());
        assert!(leg.fill_price.is_none());
        assert!(leg.slippage_pct.is_none());
    }
}
