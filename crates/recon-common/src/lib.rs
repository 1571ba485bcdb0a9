//! Shared types and parsers for the cross-venue trade reconciliation
//! engine.
//!
//! This crate contains:
//! - Common types (`DataMode`, events, `MergedLeg`, `CombinedTradeRecord`)
//! - Soft numeric coercion for dynamic JSON fields
//! - Dual-format inventory snapshot parsing and spread-delta math

pub mod inventory;
pub mod num;
pub mod types;

pub use inventory::{compute_spread_delta, parse_inventory};
pub use num::{parse_number, parse_number_str, parse_timestamp_ms};
pub use types::*;
