//! Polling loop and versioned last-good snapshot.
//!
//! Each tick allocates a monotonic sequence number and fetches the three
//! row streams concurrently. Reconciliation runs only when all fetches
//! succeed; a two-of-three outcome never produces a partial rebuild. The
//! timer can fire while an earlier tick's fetches are still in flight, so
//! [`SnapshotStore::apply`] discards any batch whose sequence is older
//! than the one already applied - without the guard a slow early batch
//! would overwrite a newer result.
//!
//! "Load more" is additive: it raises the fetch limit and folds in the
//! aggregate `_all` endpoints, after which rows are de-duplicated by
//! trace id (and venue, for leg rows).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use recon_common::CombinedTradeRecord;

use crate::api::{ApiError, BotApiClient, PairScope};
use crate::engine::reconcile;
use crate::normalize::{normalize_decisions, normalize_fills, normalize_trades};

/// Source of raw rows for one reconciliation scope.
///
/// Production uses [`BotRowSource`] over HTTP; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn decisions(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
    async fn trades(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
    async fn fills(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
    async fn decisions_all(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
    async fn trades_all(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
    async fn fills_all(&self, limit: u32) -> Result<Vec<Value>, ApiError>;
}

/// [`RowSource`] backed by the bot's HTTP API.
pub struct BotRowSource {
    client: BotApiClient,
    scope: PairScope,
}

impl BotRowSource {
    pub fn new(client: BotApiClient, scope: PairScope) -> Self {
        Self { client, scope }
    }
}

#[async_trait]
impl RowSource for BotRowSource {
    async fn decisions(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.decisions(&self.scope, limit).await
    }

    async fn trades(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.trades(&self.scope, limit).await
    }

    async fn fills(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.fills(&self.scope, limit).await
    }

    async fn decisions_all(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.decisions_all(self.scope.mode, limit).await
    }

    async fn trades_all(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.trades_all(self.scope.mode, limit).await
    }

    async fn fills_all(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.fills_all(self.scope.mode, limit).await
    }
}

/// The versioned reconciliation result held between polls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSnapshot {
    /// Sequence number of the batch this state reflects.
    pub seq: u64,
    /// When records were last successfully rebuilt.
    pub updated_at: Option<DateTime<Utc>>,
    /// Error from the most recent batch, if it failed. Records below are
    /// then from the last good batch.
    pub last_error: Option<String>,
    pub records: Vec<CombinedTradeRecord>,
}

/// Shared store for the last-good snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<ReconSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out the current snapshot.
    pub fn snapshot(&self) -> ReconSnapshot {
        self.inner.read().clone()
    }

    /// Apply a successful batch. Returns false (and changes nothing) when
    /// a newer batch has already been applied.
    pub fn apply(&self, seq: u64, records: Vec<CombinedTradeRecord>) -> bool {
        let mut inner = self.inner.write();
        if seq < inner.seq {
            return false;
        }
        inner.seq = seq;
        inner.records = records;
        inner.updated_at = Some(Utc::now());
        inner.last_error = None;
        true
    }

    /// Record a failed batch, retaining the previous good records.
    /// Stale failures are discarded like stale results.
    pub fn record_error(&self, seq: u64, error: impl Into<String>) -> bool {
        let mut inner = self.inner.write();
        if seq < inner.seq {
            return false;
        }
        inner.seq = seq;
        inner.last_error = Some(error.into());
        true
    }
}

/// Handle for the additive "load more" limit.
#[derive(Clone)]
pub struct LimitHandle {
    base: u32,
    view: Arc<AtomicU32>,
}

impl LimitHandle {
    /// Limit the next tick will fetch with.
    pub fn current(&self) -> u32 {
        self.view.load(Ordering::Relaxed)
    }

    /// Base limit from configuration.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Raise the fetch limit. Lower values are ignored - load-more only
    /// ever grows the window.
    pub fn raise(&self, limit: u32) {
        self.view.fetch_max(limit, Ordering::Relaxed);
    }
}

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Tick interval. The bot refreshes on a 4–6 s cadence.
    pub interval: Duration,
    /// Row limit for the pair endpoints.
    pub limit: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            limit: 50,
        }
    }
}

/// Sequence-numbered reconciliation poller.
pub struct Poller<S> {
    source: Arc<S>,
    store: Arc<SnapshotStore>,
    config: PollerConfig,
    seq: Arc<AtomicU64>,
    view_limit: Arc<AtomicU32>,
}

impl<S> Clone for Poller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            seq: Arc::clone(&self.seq),
            view_limit: Arc::clone(&self.view_limit),
        }
    }
}

impl<S: RowSource + 'static> Poller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        let view_limit = Arc::new(AtomicU32::new(config.limit));
        Self {
            source: Arc::new(source),
            store: Arc::new(SnapshotStore::new()),
            config,
            seq: Arc::new(AtomicU64::new(1)),
            view_limit,
        }
    }

    /// Shared snapshot store for readers.
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Shared handle to the row source.
    pub fn source_handle(&self) -> Arc<S> {
        Arc::clone(&self.source)
    }

    /// Handle for raising the fetch limit.
    pub fn limit_handle(&self) -> LimitHandle {
        LimitHandle {
            base: self.config.limit,
            view: Arc::clone(&self.view_limit),
        }
    }

    /// Run one tick: fetch, normalize, reconcile, publish.
    ///
    /// Returns true when the batch was applied (stale batches and failed
    /// fetches return false).
    pub async fn poll_once(&self) -> bool {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let view = self.view_limit.load(Ordering::Relaxed);

        match self.fetch_batch(view).await {
            Ok((decision_rows, trade_rows, fill_rows)) => {
                let decisions = normalize_decisions(&decision_rows);
                let trades = normalize_trades(&trade_rows);
                let fills = normalize_fills(&fill_rows);
                let records = reconcile(&decisions, &trades, &fills);

                let applied = self.store.apply(seq, records);
                if applied {
                    debug!(seq, rows = trade_rows.len(), "Applied reconciliation batch");
                } else {
                    debug!(seq, "Discarded stale reconciliation batch");
                }
                applied
            }
            Err(e) => {
                warn!(error = %e, seq, "Row fetch failed; retaining previous snapshot");
                self.store.record_error(seq, e.to_string());
                false
            }
        }
    }

    /// Fetch all streams for one tick. All-or-nothing: any failure fails
    /// the whole batch.
    async fn fetch_batch(
        &self,
        view: u32,
    ) -> Result<(Vec<Value>, Vec<Value>, Vec<Value>), ApiError> {
        let limit = self.config.limit;
        let (mut decisions, mut trades, mut fills) = tokio::try_join!(
            self.source.decisions(limit),
            self.source.trades(limit),
            self.source.fills(limit),
        )?;

        // Load-more window active: widen with the aggregate endpoints.
        if view > limit {
            let (d_all, t_all, f_all) = tokio::try_join!(
                self.source.decisions_all(view),
                self.source.trades_all(view),
                self.source.fills_all(view),
            )?;
            decisions = merge_rows(decisions, d_all, false);
            trades = merge_rows(trades, t_all, true);
            fills = merge_rows(fills, f_all, true);
        }

        Ok((decisions, trades, fills))
    }

    /// Run the tick loop forever. Ticks are spawned so a slow fetch never
    /// delays the next one; the sequence guard handles the overlap.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            limit = self.config.limit,
            "Reconciliation poller started"
        );

        loop {
            ticker.tick().await;
            let poller = self.clone();
            tokio::spawn(async move {
                poller.poll_once().await;
            });
        }
    }
}

/// Concatenate primary and aggregate rows, dropping duplicates.
///
/// Keyed by trace id, plus venue for leg rows. Rows without a trace id
/// are always kept - they cannot be told apart, and dropping them would
/// hide partial data.
fn merge_rows(primary: Vec<Value>, extra: Vec<Value>, with_venue: bool) -> Vec<Value> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(primary.len() + extra.len());

    for row in primary.into_iter().chain(extra) {
        if let Some(key) = row_key(&row, with_venue) {
            if !seen.insert(key) {
                continue;
            }
        }
        out.push(row);
    }

    out
}

fn row_key(row: &Value, with_venue: bool) -> Option<(String, String)> {
    let trace = row.get("trace")?.as_str()?.trim();
    if trace.is_empty() {
        return None;
    }
    let venue = if with_venue {
        row.get("venue")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string()
    } else {
        String::new()
    };
    Some((trace.to_string(), venue))
}
