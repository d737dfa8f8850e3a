//! Incremental snapshot updates
//!
//! A delta batch moves a subscriber's snapshot from `prev_version` to
//! `version`. Each entry adds a signed balance change and a signed order
//! count change to one price bucket:
//! - existing bucket: adjust it, drop it once balance or count is exactly zero
//! - missing bucket with positive count: create it at its sorted position
//! - missing bucket otherwise: inapplicable, reported and skipped
//!
//! Entries apply in arrival order, so later entries see earlier ones. The
//! publishing side derives entries from exact-view mutations with
//! `level_update_for`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::ids::Pair;
use types::numeric::Price;
use types::order::Side;

use crate::order_book::OrderLevel;
use crate::snapshot::{compare_prices, OrderBookSnapshot, OrderBookSnapshotLevel};

/// Change to one aggregated price bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevelUpdate {
    pub price: Price,
    /// Signed delta to the bucket balance.
    pub change: Decimal,
    /// Signed delta to the bucket order count.
    pub count: i64,
    pub side: Side,
}

impl OrderBookLevelUpdate {
    pub fn new(side: Side, price: Price, change: Decimal, count: i64) -> Self {
        Self {
            price,
            change,
            count,
            side,
        }
    }
}

/// Ordered batch transforming a snapshot from `prev_version` to `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSnapshotUpdate {
    pub pair: Pair,
    pub updates: Vec<OrderBookLevelUpdate>,
    pub prev_version: u64,
    pub version: u64,
}

/// Errors raised in strict mode, before the snapshot is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("pair mismatch: snapshot {expected}, update {actual}")]
    PairMismatch { expected: String, actual: String },

    #[error("version gap: snapshot at {expected}, update from {actual}")]
    VersionGap { expected: u64, actual: u64 },
}

/// How `prev_version` is checked against the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Trust the batch: gaps and pair mismatches are logged, then applied.
    #[default]
    Permissive,
    /// Reject any batch whose `prev_version` or pair does not match.
    Strict,
}

/// Configuration for the snapshot updater.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdaterConfig {
    pub version_policy: VersionPolicy,
}

/// Receives entries that could not be applied.
pub trait DiagnosticsSink {
    fn inapplicable_update(&self, pair: &Pair, update: &OrderBookLevelUpdate);
}

/// Logs inapplicable entries at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn inapplicable_update(&self, pair: &Pair, update: &OrderBookLevelUpdate) {
        debug!(
            pair = %pair,
            side = %update.side,
            price = %update.price,
            change = %update.change,
            count = update.count,
            "Trying to remove non existing snapshot level, ignored"
        );
    }
}

/// What a batch did to the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Entries that adjusted an existing bucket (including removals).
    pub applied: usize,
    /// Buckets created.
    pub created: usize,
    /// Buckets removed.
    pub removed: usize,
    /// Inapplicable entries, in arrival order.
    pub skipped: Vec<OrderBookLevelUpdate>,
}

/// Applies delta batches to subscriber-held snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotUpdater<S = TracingSink> {
    config: UpdaterConfig,
    sink: S,
}

impl SnapshotUpdater<TracingSink> {
    pub fn new(config: UpdaterConfig) -> Self {
        Self {
            config,
            sink: TracingSink,
        }
    }
}

impl<S: DiagnosticsSink> SnapshotUpdater<S> {
    pub fn with_sink(config: UpdaterConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply one batch in place.
    ///
    /// In strict mode a mismatching batch is rejected and the snapshot is
    /// left untouched. Otherwise both sides stay sorted and the snapshot
    /// ends at `update.version`. Bucket values are not clamped: a created
    /// bucket takes `change` as is, and a bucket driven negative is kept
    /// until a field returns to exactly zero.
    pub fn apply(
        &self,
        snapshot: &mut OrderBookSnapshot,
        update: &OrderBookSnapshotUpdate,
    ) -> Result<ApplyReport, SnapshotError> {
        self.check_continuity(snapshot, update)?;

        snapshot.version = update.version;
        let mut report = ApplyReport::default();

        for level_update in &update.updates {
            match apply_level(snapshot, level_update) {
                LevelOutcome::Adjusted => report.applied += 1,
                LevelOutcome::Removed => {
                    report.applied += 1;
                    report.removed += 1;
                }
                LevelOutcome::Created => report.created += 1,
                LevelOutcome::Inapplicable => {
                    self.sink.inapplicable_update(&update.pair, level_update);
                    report.skipped.push(level_update.clone());
                }
            }
        }

        debug!(
            pair = %update.pair,
            version = update.version,
            applied = report.applied,
            created = report.created,
            removed = report.removed,
            skipped = report.skipped.len(),
            "Applied snapshot update"
        );
        Ok(report)
    }

    fn check_continuity(
        &self,
        snapshot: &OrderBookSnapshot,
        update: &OrderBookSnapshotUpdate,
    ) -> Result<(), SnapshotError> {
        let pair_matches = snapshot.pair == update.pair;
        let contiguous = snapshot.version == update.prev_version;

        match self.config.version_policy {
            VersionPolicy::Strict if !pair_matches => Err(SnapshotError::PairMismatch {
                expected: snapshot.pair.to_string(),
                actual: update.pair.to_string(),
            }),
            VersionPolicy::Strict if !contiguous => Err(SnapshotError::VersionGap {
                expected: snapshot.version,
                actual: update.prev_version,
            }),
            VersionPolicy::Permissive if !pair_matches || !contiguous => {
                warn!(
                    snapshot_pair = %snapshot.pair,
                    update_pair = %update.pair,
                    snapshot_version = snapshot.version,
                    prev_version = update.prev_version,
                    "Snapshot update does not continue the current version, applying anyway"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Apply a batch with the permissive policy, logging skipped entries.
pub fn apply_update(
    snapshot: &mut OrderBookSnapshot,
    update: &OrderBookSnapshotUpdate,
) -> ApplyReport {
    let updater = SnapshotUpdater::new(UpdaterConfig::default());
    match updater.apply(snapshot, update) {
        Ok(report) => report,
        // Permissive mode never rejects a batch
        Err(_) => ApplyReport::default(),
    }
}

enum LevelOutcome {
    Adjusted,
    Removed,
    Created,
    Inapplicable,
}

fn apply_level(snapshot: &mut OrderBookSnapshot, update: &OrderBookLevelUpdate) -> LevelOutcome {
    let side = update.side;
    let levels = snapshot.levels_mut(side);

    match levels.binary_search_by(|l| compare_prices(l.price, update.price, side)) {
        Ok(pos) => {
            let bucket = &mut levels[pos];
            let (Some(balance), Some(count)) = (
                bucket.balance.checked_add(update.change),
                bucket.count.checked_add(update.count),
            ) else {
                warn!(
                    side = %side,
                    price = %bucket.price,
                    change = %update.change,
                    count = update.count,
                    "Snapshot update overflows bucket, ignored"
                );
                return LevelOutcome::Inapplicable;
            };
            bucket.balance = balance;
            bucket.count = count;

            if bucket.balance < Decimal::ZERO || bucket.count < 0 {
                warn!(
                    side = %side,
                    price = %bucket.price,
                    balance = %bucket.balance,
                    count = bucket.count,
                    "Snapshot bucket went negative"
                );
            }

            // Either field reaching exactly zero removes the bucket
            if bucket.balance.is_zero() || bucket.count == 0 {
                levels.remove(pos);
                LevelOutcome::Removed
            } else {
                LevelOutcome::Adjusted
            }
        }
        Err(pos) if update.count > 0 => {
            levels.insert(
                pos,
                OrderBookSnapshotLevel::new(update.price, update.change, update.count),
            );
            LevelOutcome::Created
        }
        Err(_) => LevelOutcome::Inapplicable,
    }
}

/// Bucket delta produced by moving one exact-view entry from `before` to
/// `after`.
///
/// An entry contributes `(balance, 1)` to its price bucket while its
/// balance is positive and nothing otherwise. Returns `None` when the
/// aggregated view is unaffected.
pub fn level_update_for(
    side: Side,
    before: Option<&OrderLevel>,
    after: Option<&OrderLevel>,
) -> Option<OrderBookLevelUpdate> {
    let contribution = |level: Option<&OrderLevel>| match level {
        Some(l) if l.is_quotable() => (l.balance, 1i64),
        _ => (Decimal::ZERO, 0i64),
    };

    let price = after.or(before)?.price;
    let (old_balance, old_count) = contribution(before);
    let (new_balance, new_count) = contribution(after);

    let change = new_balance - old_balance;
    let count = new_count - old_count;
    if change.is_zero() && count == 0 {
        return None;
    }
    Some(OrderBookLevelUpdate::new(side, price, change, count))
}
