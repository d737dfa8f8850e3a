//! Market Data Service
//!
//! Maintains a two-sided limit order book per trading pair and publishes it
//! to subscribers:
//! - Exact per-order view with price-time priority
//! - Price-aggregated, versioned snapshots
//! - Incremental delta batches that replicas apply to their snapshots
//! - Mid price and spread over either view
//!
//! # Architecture
//!
//! ```text
//! Live orders / level update events
//!        │
//!   ┌────▼─────┐
//!   │OrderBook │  ← exact view, one mutation primitive
//!   └────┬─────┘
//!        │ Mutation (before/after)
//!   ┌────▼─────┐      ┌──────────┐
//!   │PairBook  │─────►│Snapshot  │  ← authoritative aggregation
//!   └────┬─────┘      └──────────┘
//!        │ OrderBookSnapshotUpdate
//!   ┌────▼──────────┐
//!   │SnapshotUpdater│  ← replica side
//!   └───────────────┘
//! ```
//!
//! Everything here is synchronous and single-writer per pair.

pub mod config;
pub mod delta;
pub mod events;
pub mod metrics;
pub mod order_book;
pub mod publisher;
pub mod snapshot;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
