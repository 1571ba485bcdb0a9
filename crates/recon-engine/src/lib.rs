//! Trade reconciliation engine for cross-venue arbitrage review.
//!
//! This crate fuses three independently-polled, loosely-correlated event
//! streams from a two-venue arbitrage bot - trading decisions, per-venue
//! order attempts, and per-venue fills - into consistent
//! [`CombinedTradeRecord`]s for operator review.
//!
//! ## Modules
//!
//! - `normalize`: dynamic JSON rows → typed events (the only boundary
//!   that touches untyped data)
//! - `engine`: the pure reconciliation pipeline (group → pair →
//!   classify → build)
//! - `api`: read-only HTTP client for the bot's row endpoints
//! - `poller`: sequence-numbered polling with a versioned last-good
//!   snapshot
//! - `server`: REST read API for the presentation layer
//! - `config`: TOML + env + CLI configuration
//!
//! ## Hard cases the engine owns
//!
//! - out-of-order, asynchronous arrival across the three streams
//! - legs without a shared correlation id, paired heuristically
//! - two incompatible inventory-snapshot encodings
//! - partial inputs, surfaced as partial records - never fabricated data

pub mod api;
pub mod config;
pub mod engine;
pub mod normalize;
pub mod poller;
pub mod server;

pub use api::{ApiError, BotApiClient, PairScope};
pub use config::ReconConfig;
pub use engine::reconcile;
pub use normalize::{
    normalize_decision, normalize_decisions, normalize_fill, normalize_fills, normalize_trade,
    normalize_trades,
};
pub use poller::{
    BotRowSource, LimitHandle, Poller, PollerConfig, ReconSnapshot, RowSource, SnapshotStore,
};
pub use server::{spawn_api_server, ApiServerConfig, ServerState};

// The parser surface consumed directly by the presentation layer.
pub use recon_common::{
    compute_spread_delta, parse_inventory, parse_number, CombinedTradeRecord, DataMode,
    DecisionEvent, FillLegEvent, InventoryEntry, MergedLeg, TradeLegEvent,
};
