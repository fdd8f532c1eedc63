//! The event aggregator: ingests batches of topic-keyed events over
//! HTTP, deduplicates them idempotently across process restarts, and
//! serves query and statistics endpoints.

pub mod consumer;
pub mod dedup;
pub mod error;
pub mod http;
pub mod state;
pub mod stats;

use std::sync::Arc;

use aggregator_domain::event::Event;
use tokio::sync::mpsc;

use consumer::Consumer;
use dedup::DedupStore;
use state::AppState;
use stats::Stats;

/// Construct the router and the Consumer task together, wired through
/// a shared [`DedupStore`] and [`Stats`] instance. The caller is
/// responsible for spawning the returned consumer future and for
/// serving the router; this split is what lets integration tests drive
/// the router directly without a real TCP listener.
pub async fn build(queue_capacity: usize) -> aggregator_common::Result<(axum::Router, Consumer)> {
    aggregator_common::db::ensure_schema().await?;

    let store = DedupStore::new();
    let (unique_processed, topics) = store.rehydrate().await?;
    let stats = Arc::new(Stats::new(unique_processed, topics));

    let (tx, rx) = mpsc::channel::<Event>(queue_capacity);
    let consumer = Consumer::new(rx, store, stats.clone());

    let state = AppState {
        store,
        stats,
        queue: tx,
    };

    Ok((http::router(state), consumer))
}
