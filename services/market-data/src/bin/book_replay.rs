//! Replays a recorded book through a publisher and a replica.
//!
//! Usage: `book-replay <fixture.json> [config.json]`
//!
//! The fixture holds a pair, its live orders and an ordered list of level
//! update events. With `startTime` set, versions come from a clock that
//! ticks one millisecond per read so the output is reproducible.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;

use anyhow::{bail, Context};
use serde::Deserialize;
use types::ids::{OrderHash, Pair};
use types::order::{LiveOrder, Side};
use types::time::{Clock, SystemClock};

use market_data::config::MarketDataConfig;
use market_data::delta::SnapshotUpdater;
use market_data::events::LevelUpdateEvent;
use market_data::metrics::{mid, spread};
use market_data::publisher::PairBook;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    pair: Pair,
    #[serde(default)]
    start_time: Option<u64>,
    #[serde(default)]
    live_orders: BTreeMap<OrderHash, LiveOrder>,
    #[serde(default)]
    events: Vec<LevelUpdateEvent>,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: book-replay <fixture.json> [config.json]");
    }

    let raw = fs::read_to_string(&args[1]).with_context(|| format!("reading {}", args[1]))?;
    let fixture: Fixture =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args[1]))?;

    let config = match args.get(2) {
        Some(path) => MarketDataConfig::load(path)?,
        None => MarketDataConfig::default(),
    };

    tracing::info!(
        pair = %fixture.pair,
        orders = fixture.live_orders.len(),
        events = fixture.events.len(),
        "Starting book replay"
    );

    match fixture.start_time {
        Some(start) => {
            let now = Cell::new(start);
            let clock = || {
                let t = now.get();
                now.set(t + 1);
                t
            };
            replay(&fixture, &config, clock)
        }
        None => replay(&fixture, &config, SystemClock),
    }
}

fn replay<C: Clock>(
    fixture: &Fixture,
    config: &MarketDataConfig,
    clock: C,
) -> Result<(), anyhow::Error> {
    let mut publisher = PairBook::new(
        fixture.pair.clone(),
        &fixture.live_orders,
        clock,
        config.publisher.clone(),
    )?;
    let updater = SnapshotUpdater::new(config.updater.clone());
    let mut replica = publisher.snapshot().clone();

    let mut rejected = 0usize;
    let mut batches = Vec::new();
    for event in &fixture.events {
        match publisher.apply_event(event) {
            Ok(outcome) => batches.extend(outcome.flushed),
            Err(e) => {
                rejected += 1;
                tracing::warn!(order_hash = %event.order_hash, error = %e, "Rejected event");
            }
        }
    }
    batches.extend(publisher.flush());

    for batch in &batches {
        let report = updater.apply(&mut replica, batch)?;
        tracing::info!(
            version = batch.version,
            applied = report.applied,
            created = report.created,
            removed = report.removed,
            skipped = report.skipped.len(),
            mid = %mid(&replica),
            spread = %spread(&replica),
            "Replica advanced"
        );
    }

    let authoritative = publisher.render();
    if replica.content_checksum() != authoritative.content_checksum() {
        bail!(
            "replica diverged from the book at version {}",
            replica.version
        );
    }

    tracing::info!(
        events = publisher.events_applied(),
        rejected,
        batches = batches.len(),
        checksum = %replica.content_checksum(),
        "Replica converged"
    );

    for side in [Side::Bid, Side::Ask] {
        for level in replica.depth(side, config.depth) {
            tracing::info!(
                side = %side,
                price = %level.price,
                balance = %level.balance,
                count = level.count,
                "Depth"
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&replica)?);
    Ok(())
}
