//! Price-aggregated snapshots of the book
//!
//! Collapses the exact view into one bucket per price per side, carrying the
//! summed balance and the number of contributing orders. Snapshots are
//! versioned with the time source passed in by the caller and are what
//! subscribers hold and patch with deltas.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use types::ids::Pair;
use types::numeric::Price;
use types::order::Side;
use types::time::Clock;

use crate::order_book::{OrderBook, OrderLevel};

/// Combined balance and order count at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshotLevel {
    pub price: Price,
    pub balance: Decimal,
    pub count: i64,
}

impl OrderBookSnapshotLevel {
    pub fn new(price: Price, balance: Decimal, count: i64) -> Self {
        Self {
            price,
            balance,
            count,
        }
    }
}

/// Best-first price ordering for one side (bids descending, asks ascending).
pub fn compare_prices(a: Price, b: Price, side: Side) -> Ordering {
    match side {
        Side::Bid => b.cmp(&a),
        Side::Ask => a.cmp(&b),
    }
}

/// Aggregated, versioned view of a pair's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub pair: Pair,
    /// Unix millis of the render or of the last applied delta batch.
    pub version: u64,
    /// Descending price order (best first).
    pub bids: Vec<OrderBookSnapshotLevel>,
    /// Ascending price order (best first).
    pub asks: Vec<OrderBookSnapshotLevel>,
}

impl OrderBookSnapshot {
    pub fn empty(pair: Pair, version: u64) -> Self {
        Self {
            pair,
            version,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn levels(&self, side: Side) -> &[OrderBookSnapshotLevel] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub(crate) fn levels_mut(&mut self, side: Side) -> &mut Vec<OrderBookSnapshotLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Bucket at an exact price, if any.
    pub fn bucket(&self, side: Side, price: Price) -> Option<&OrderBookSnapshotLevel> {
        let levels = self.levels(side);
        levels
            .binary_search_by(|l| compare_prices(l.price, price, side))
            .ok()
            .map(|pos| &levels[pos])
    }

    /// First `n` buckets of one side.
    pub fn depth(&self, side: Side, n: usize) -> &[OrderBookSnapshotLevel] {
        let levels = self.levels(side);
        &levels[..n.min(levels.len())]
    }

    pub fn best_bid(&self) -> Option<&OrderBookSnapshotLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&OrderBookSnapshotLevel> {
        self.asks.first()
    }

    /// SHA-256 over the buckets of both sides.
    ///
    /// Ignores `version`, so a replica patched by deltas and a fresh render
    /// of the same book produce the same digest. Decimals are normalized
    /// so `10` and `10.0` hash alike.
    pub fn content_checksum(&self) -> String {
        let mut hasher = Sha256::new();

        for level in &self.bids {
            hash_level(&mut hasher, level);
        }
        hasher.update(b"---");

        for level in &self.asks {
            hash_level(&mut hasher, level);
        }
        hasher.update(b"---");

        format!("{:x}", hasher.finalize())
    }
}

fn hash_level(hasher: &mut Sha256, level: &OrderBookSnapshotLevel) {
    hasher.update(level.price.as_decimal().normalize().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(level.balance.normalize().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(level.count.to_le_bytes());
    hasher.update(b"|");
}

/// Collapse one side of the exact view into price buckets.
///
/// Input must already be in priority order so equal prices are contiguous.
/// Orders with a non-positive balance contribute nothing. A side with no
/// eligible orders yields an empty vector.
pub fn aggregate_side<'a, I>(levels: I) -> Vec<OrderBookSnapshotLevel>
where
    I: IntoIterator<Item = &'a OrderLevel>,
{
    let mut buckets: Vec<OrderBookSnapshotLevel> = Vec::new();
    let mut current: Option<OrderBookSnapshotLevel> = None;

    for level in levels {
        if !level.is_quotable() {
            continue;
        }

        match current.as_mut() {
            Some(bucket) if bucket.price == level.price => {
                bucket.balance += level.balance;
                bucket.count += 1;
            }
            _ => {
                if let Some(closed) = current.take() {
                    buckets.push(closed);
                }
                current = Some(OrderBookSnapshotLevel::new(level.price, level.balance, 1));
            }
        }
    }

    if let Some(last) = current {
        buckets.push(last);
    }
    buckets
}

/// Render a full snapshot of `book`, versioned with the clock's current time.
pub fn render_snapshot<C: Clock + ?Sized>(
    pair: &Pair,
    book: &OrderBook,
    clock: &C,
) -> OrderBookSnapshot {
    let snapshot = OrderBookSnapshot {
        pair: pair.clone(),
        version: clock.now_ms(),
        bids: aggregate_side(book.bids()),
        asks: aggregate_side(book.asks()),
    };

    info!(
        pair = %pair,
        version = snapshot.version,
        bid_levels = snapshot.bids.len(),
        ask_levels = snapshot.asks.len(),
        "Rendered order book snapshot"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderHash;
    use types::time::FixedClock;

    fn level(hash: &str, price: u64, balance: i64, seq: u64) -> OrderLevel {
        OrderLevel::new(
            OrderHash::new(hash),
            Price::from_u64(price),
            Decimal::from(balance),
            seq,
        )
    }

    fn bid_levels() -> Vec<OrderLevel> {
        vec![
            level("orderHash1", 120, 20, 11),
            level("orderHash2", 100, 20, 10),
            level("orderHash4", 100, 20, 13),
            level("orderHash3", 100, 30, 12),
        ]
    }

    fn bucket(price: u64, balance: i64, count: i64) -> OrderBookSnapshotLevel {
        OrderBookSnapshotLevel::new(Price::from_u64(price), Decimal::from(balance), count)
    }

    #[test]
    fn test_aggregate_side() {
        let buckets = aggregate_side(&bid_levels());
        assert_eq!(buckets, vec![bucket(120, 20, 1), bucket(100, 70, 3)]);
    }

    #[test]
    fn test_aggregate_skips_zero_balance() {
        let mut levels = bid_levels();
        levels[0].balance = Decimal::ZERO;

        let buckets = aggregate_side(&levels);
        assert_eq!(buckets, vec![bucket(100, 70, 3)]);
    }

    #[test]
    fn test_aggregate_zero_balance_inside_group() {
        let mut levels = bid_levels();
        levels[2].balance = Decimal::ZERO;

        let buckets = aggregate_side(&levels);
        assert_eq!(buckets, vec![bucket(120, 20, 1), bucket(100, 50, 2)]);
    }

    #[test]
    fn test_aggregate_all_zero_is_empty() {
        let mut levels = bid_levels();
        for l in levels.iter_mut() {
            l.balance = Decimal::ZERO;
        }
        assert!(aggregate_side(&levels).is_empty());
        assert!(aggregate_side(&Vec::new()).is_empty());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let levels = bid_levels();
        assert_eq!(aggregate_side(&levels), aggregate_side(&levels));
    }

    #[test]
    fn test_render_snapshot() {
        let mut book = OrderBook::new();
        for l in bid_levels() {
            book.apply_level_update(l, Side::Bid, false);
        }
        book.apply_level_update(level("ask1", 130, 4, 20), Side::Ask, false);
        book.apply_level_update(level("ask2", 140, 0, 21), Side::Ask, false);

        let pair = Pair::new("aETH|WETH");
        let snapshot = render_snapshot(&pair, &book, &FixedClock(1234567890000));

        assert_eq!(snapshot.pair, pair);
        assert_eq!(snapshot.version, 1234567890000);
        assert_eq!(snapshot.bids, vec![bucket(120, 20, 1), bucket(100, 70, 3)]);
        assert_eq!(snapshot.asks, vec![bucket(130, 4, 1)]);
    }

    #[test]
    fn test_render_empty_book() {
        let snapshot = render_snapshot(&Pair::new("aETH|WETH"), &OrderBook::new(), &FixedClock(1));
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.asks.is_empty());
    }

    #[test]
    fn test_bucket_lookup_and_depth() {
        let mut snapshot = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 1);
        snapshot.bids = vec![bucket(120, 20, 4), bucket(110, 10, 6), bucket(100, 30, 5)];
        snapshot.asks = vec![bucket(130, 20, 4), bucket(140, 10, 6)];

        assert_eq!(snapshot.bucket(Side::Bid, Price::from_u64(110)).unwrap().count, 6);
        assert!(snapshot.bucket(Side::Bid, Price::from_u64(115)).is_none());
        assert_eq!(snapshot.bucket(Side::Ask, Price::from_u64(140)).unwrap().count, 6);
        assert_eq!(snapshot.depth(Side::Bid, 2).len(), 2);
        assert_eq!(snapshot.depth(Side::Ask, 10).len(), 2);
        assert_eq!(snapshot.best_bid().unwrap().price, Price::from_u64(120));
        assert_eq!(snapshot.best_ask().unwrap().price, Price::from_u64(130));
    }

    #[test]
    fn test_checksum_ignores_version_and_scale() {
        let mut a = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 1);
        a.bids = vec![bucket(100, 10, 2)];
        let mut b = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 2);
        b.bids = vec![OrderBookSnapshotLevel::new(
            "100.0".parse().unwrap(),
            Decimal::new(1000, 2),
            2,
        )];

        assert_eq!(a.content_checksum(), b.content_checksum());

        b.bids[0].count = 3;
        assert_ne!(a.content_checksum(), b.content_checksum());
    }

    #[test]
    fn test_checksum_distinguishes_sides() {
        let mut a = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 1);
        a.bids = vec![bucket(100, 10, 1)];
        let mut b = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 1);
        b.asks = vec![bucket(100, 10, 1)];
        assert_ne!(a.content_checksum(), b.content_checksum());
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut snapshot = OrderBookSnapshot::empty(Pair::new("aETH|WETH"), 1234567890000);
        snapshot.bids = vec![bucket(100, 10, 1)];

        let json = serde_json::to_string(&snapshot).unwrap();
        let deserialized: OrderBookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, deserialized);
    }
}
