//! Single-writer publisher for one pair
//!
//! Owns a pair's exact view and its authoritative snapshot. Every accepted
//! event mutates the book and queues the bucket delta it caused; batches of
//! deltas are flushed as versioned `OrderBookSnapshotUpdate`s that replicas
//! apply in order. Pairs are independent: run one `PairBook` per pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::errors::ValidationError;
use types::ids::{OrderHash, Pair};
use types::order::LiveOrder;
use types::time::{Clock, SystemClock};

use crate::delta::{
    level_update_for, OrderBookLevelUpdate, OrderBookSnapshotUpdate, SnapshotUpdater,
    UpdaterConfig,
};
use crate::events::LevelUpdateEvent;
use crate::order_book::{MutationResult, OrderBook};
use crate::snapshot::{render_snapshot, OrderBookSnapshot};

/// Configuration for the per-pair publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublisherConfig {
    /// Pending deltas that trigger an automatic flush.
    pub max_batch_size: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self { max_batch_size: 64 }
    }
}

/// What a single event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub mutation: MutationResult,
    /// Bucket delta queued for the next batch, if the aggregated view moved.
    pub delta: Option<OrderBookLevelUpdate>,
    /// Batch published because this event filled it.
    pub flushed: Option<OrderBookSnapshotUpdate>,
}

/// Exact view plus authoritative snapshot for one pair.
pub struct PairBook<C: Clock = SystemClock> {
    pair: Pair,
    book: OrderBook,
    snapshot: OrderBookSnapshot,
    pending: Vec<OrderBookLevelUpdate>,
    updater: SnapshotUpdater,
    clock: C,
    config: PublisherConfig,
    events_applied: u64,
    batches_published: u64,
}

impl<C: Clock> PairBook<C> {
    /// Build the exact view from the live-order set and render the initial
    /// snapshot.
    pub fn new(
        pair: Pair,
        live_orders: &BTreeMap<OrderHash, LiveOrder>,
        clock: C,
        config: PublisherConfig,
    ) -> Result<Self, ValidationError> {
        let book = OrderBook::build_from_live_orders(live_orders)?;
        let snapshot = render_snapshot(&pair, &book, &clock);

        info!(
            pair = %pair,
            orders = book.len(),
            version = snapshot.version,
            max_batch_size = config.max_batch_size,
            "PairBook initialized"
        );

        Ok(Self {
            pair,
            book,
            snapshot,
            pending: Vec::new(),
            updater: SnapshotUpdater::new(UpdaterConfig::default()),
            clock,
            config,
            events_applied: 0,
            batches_published: 0,
        })
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Snapshot as of the last flush. Pending deltas are not included.
    pub fn snapshot(&self) -> &OrderBookSnapshot {
        &self.snapshot
    }

    /// Fresh aggregation of the current exact view, for late joiners and
    /// convergence checks.
    pub fn render(&self) -> OrderBookSnapshot {
        render_snapshot(&self.pair, &self.book, &self.clock)
    }

    pub fn pending(&self) -> &[OrderBookLevelUpdate] {
        &self.pending
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    pub fn batches_published(&self) -> u64 {
        self.batches_published
    }

    /// Validate and apply one event.
    ///
    /// A malformed event is rejected before the book is touched.
    pub fn apply_event(&mut self, event: &LevelUpdateEvent) -> Result<EventOutcome, ValidationError> {
        event.validate()?;

        let mutation = self
            .book
            .apply_level_update(event.to_level(), event.side, event.is_terminate);
        self.events_applied += 1;

        let delta = level_update_for(event.side, mutation.before.as_ref(), mutation.after.as_ref());
        if let Some(update) = &delta {
            self.pending.push(update.clone());
        }

        let flushed = if self.pending.len() >= self.config.max_batch_size.max(1) {
            self.flush()
        } else {
            None
        };

        Ok(EventOutcome {
            mutation: mutation.result,
            delta,
            flushed,
        })
    }

    /// Publish pending deltas as one batch and advance the owned snapshot.
    ///
    /// Returns `None` when nothing is pending. Versions strictly increase
    /// even if the clock stalls or steps back.
    pub fn flush(&mut self) -> Option<OrderBookSnapshotUpdate> {
        if self.pending.is_empty() {
            return None;
        }

        let prev_version = self.snapshot.version;
        let version = self.clock.now_ms().max(prev_version + 1);
        let update = OrderBookSnapshotUpdate {
            pair: self.pair.clone(),
            updates: std::mem::take(&mut self.pending),
            prev_version,
            version,
        };

        match self.updater.apply(&mut self.snapshot, &update) {
            Ok(report) if !report.skipped.is_empty() => {
                warn!(
                    pair = %self.pair,
                    version,
                    skipped = report.skipped.len(),
                    "Authoritative snapshot skipped published deltas"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(pair = %self.pair, error = %e, "Failed to advance authoritative snapshot");
            }
        }

        self.batches_published += 1;
        debug!(
            pair = %self.pair,
            prev_version,
            version,
            updates = update.updates.len(),
            "Published snapshot update"
        );
        Some(update)
    }
}
