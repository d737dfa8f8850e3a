//! Exact per-order view of a pair's book
//!
//! Each side holds one `OrderLevel` per live order, kept in price-time
//! priority:
//! - bids: price descending, then balance ascending, then admission order
//! - asks: price ascending, then balance ascending, then admission order
//!
//! Entries are indexed by `OrderHash`, so a mutation repositions a single
//! entry instead of re-sorting the side. Zero-balance orders stay in this
//! view; they are filtered out only when aggregating.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::errors::ValidationError;
use types::ids::OrderHash;
use types::numeric::Price;
use types::order::{LiveOrder, Side};

/// A single live order's contribution to its side of the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLevel {
    pub order_hash: OrderHash,
    pub price: Price,
    /// Remaining fillable amount.
    pub balance: Decimal,
    /// Admission counter, used as the arrival-time tie-break.
    pub initial_sequence: u64,
}

impl OrderLevel {
    pub fn new(
        order_hash: OrderHash,
        price: Price,
        balance: Decimal,
        initial_sequence: u64,
    ) -> Self {
        Self {
            order_hash,
            price,
            balance,
            initial_sequence,
        }
    }

    /// Project a live order onto the exact view. The map key wins over the
    /// hash embedded in the record.
    pub fn from_live_order(order_hash: &OrderHash, order: &LiveOrder) -> Self {
        Self {
            order_hash: order_hash.clone(),
            price: order.price,
            balance: order.balance,
            initial_sequence: order.initial_sequence,
        }
    }

    pub fn is_quotable(&self) -> bool {
        self.balance > Decimal::ZERO
    }
}

/// Price-time priority for one side of the book.
///
/// Total order: price (side dependent), balance ascending, initial sequence
/// ascending, and finally the order hash so two distinct orders never tie.
pub fn compare_levels(a: &OrderLevel, b: &OrderLevel, side: Side) -> Ordering {
    let by_price = match side {
        Side::Bid => b.price.cmp(&a.price),
        Side::Ask => a.price.cmp(&b.price),
    };
    by_price
        .then_with(|| a.balance.cmp(&b.balance))
        .then_with(|| a.initial_sequence.cmp(&b.initial_sequence))
        .then_with(|| a.order_hash.cmp(&b.order_hash))
}

/// Sort a slice of levels in place per `compare_levels`.
pub fn sort_levels(levels: &mut [OrderLevel], side: Side) {
    levels.sort_by(|a, b| compare_levels(a, b, side));
}

/// Outcome of a single-order mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationResult {
    /// A new order entered the book.
    Created,
    /// Either a terminate for an unknown order, or an update that left a
    /// positive balance. Inspect `Mutation::before` to tell them apart.
    NoChange,
    /// The order's positive balance is gone.
    Depleted,
}

impl MutationResult {
    /// Signed code (+1 created, 0 no change, -1 depleted).
    pub fn as_code(&self) -> i8 {
        match self {
            MutationResult::Created => 1,
            MutationResult::NoChange => 0,
            MutationResult::Depleted => -1,
        }
    }
}

/// Result of `OrderBook::apply_level_update`, with the affected entry as it
/// was before and after the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub result: MutationResult,
    pub before: Option<OrderLevel>,
    pub after: Option<OrderLevel>,
}

/// Ordering wrapper so the side's `BTreeSet` follows price-time priority.
#[derive(Debug, Clone)]
struct Ranked {
    side: Side,
    level: OrderLevel,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_levels(&self.level, &other.level, self.side)
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One side of the exact view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BookSide {
    side: Side,
    ranked: BTreeSet<Ranked>,
    index: BTreeMap<OrderHash, OrderLevel>,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            ranked: BTreeSet::new(),
            index: BTreeMap::new(),
        }
    }

    fn get(&self, order_hash: &OrderHash) -> Option<&OrderLevel> {
        self.index.get(order_hash)
    }

    fn insert(&mut self, level: OrderLevel) {
        if let Some(previous) = self.index.insert(level.order_hash.clone(), level.clone()) {
            self.ranked.remove(&Ranked {
                side: self.side,
                level: previous,
            });
        }
        self.ranked.insert(Ranked {
            side: self.side,
            level,
        });
    }

    fn remove(&mut self, order_hash: &OrderHash) -> Option<OrderLevel> {
        let level = self.index.remove(order_hash)?;
        self.ranked.remove(&Ranked {
            side: self.side,
            level: level.clone(),
        });
        Some(level)
    }

    fn iter(&self) -> impl Iterator<Item = &OrderLevel> + '_ {
        self.ranked.iter().map(|r| &r.level)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

/// Exact view of one pair's book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl OrderBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
        }
    }

    /// Rebuild the exact view from the full live-order set.
    ///
    /// Every order is kept, including zero-balance ones. Malformed records
    /// are rejected before anything is inserted.
    pub fn build_from_live_orders(
        orders: &BTreeMap<OrderHash, LiveOrder>,
    ) -> Result<Self, ValidationError> {
        for order in orders.values() {
            order.validate()?;
        }

        let mut book = Self::new();
        for (order_hash, order) in orders {
            book.side_mut(order.side)
                .insert(OrderLevel::from_live_order(order_hash, order));
        }

        debug!(
            bids = book.bids.len(),
            asks = book.asks.len(),
            "Order book rebuilt from live orders"
        );
        Ok(book)
    }

    /// The single mutation primitive.
    ///
    /// - terminate, unknown order: `NoChange`, book untouched
    /// - terminate, known order: entry removed; `Depleted` if it still had
    ///   a positive balance, else `NoChange`
    /// - update, known order: balance overwritten and entry repositioned;
    ///   `NoChange` if the balance stays positive, else `Depleted`
    /// - update, unknown order: `new_level` inserted; `Created`
    pub fn apply_level_update(
        &mut self,
        new_level: OrderLevel,
        side: Side,
        is_terminate: bool,
    ) -> Mutation {
        let book_side = self.side_mut(side);
        let existing = book_side.get(&new_level.order_hash).cloned();

        let mutation = match (is_terminate, existing) {
            (true, None) => Mutation {
                result: MutationResult::NoChange,
                before: None,
                after: None,
            },
            (true, Some(before)) => {
                book_side.remove(&before.order_hash);
                let result = if before.is_quotable() {
                    MutationResult::Depleted
                } else {
                    MutationResult::NoChange
                };
                Mutation {
                    result,
                    before: Some(before),
                    after: None,
                }
            }
            (false, Some(before)) => {
                let mut after = before.clone();
                after.balance = new_level.balance;
                book_side.insert(after.clone());
                let result = if after.is_quotable() {
                    MutationResult::NoChange
                } else {
                    MutationResult::Depleted
                };
                Mutation {
                    result,
                    before: Some(before),
                    after: Some(after),
                }
            }
            (false, None) => {
                book_side.insert(new_level.clone());
                Mutation {
                    result: MutationResult::Created,
                    before: None,
                    after: Some(new_level),
                }
            }
        };

        debug!(
            side = %side,
            order_hash = %mutation
                .before
                .as_ref()
                .or(mutation.after.as_ref())
                .map(|l| l.order_hash.as_str())
                .unwrap_or_default(),
            is_terminate,
            result = ?mutation.result,
            "Applied level update"
        );
        mutation
    }

    /// Levels of one side in priority order.
    pub fn levels(&self, side: Side) -> impl Iterator<Item = &OrderLevel> + '_ {
        self.side_ref(side).iter()
    }

    /// Bid levels (best first).
    pub fn bids(&self) -> impl Iterator<Item = &OrderLevel> + '_ {
        self.bids.iter()
    }

    /// Ask levels (best first).
    pub fn asks(&self) -> impl Iterator<Item = &OrderLevel> + '_ {
        self.asks.iter()
    }

    /// First `n` levels of one side.
    pub fn depth(&self, side: Side, n: usize) -> Vec<OrderLevel> {
        self.levels(side).take(n).cloned().collect()
    }

    /// Look up a single order.
    pub fn get(&self, side: Side, order_hash: &OrderHash) -> Option<&OrderLevel> {
        self.side_ref(side).get(order_hash)
    }

    /// Highest-priority bid with a positive balance.
    pub fn best_bid(&self) -> Option<&OrderLevel> {
        self.bids.iter().find(|l| l.is_quotable())
    }

    /// Highest-priority ask with a positive balance.
    pub fn best_ask(&self) -> Option<&OrderLevel> {
        self.asks.iter().find(|l| l.is_quotable())
    }

    /// Number of orders on one side.
    pub fn side_len(&self, side: Side) -> usize {
        self.side_ref(side).len()
    }

    /// Total number of orders on both sides.
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn side_ref(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
