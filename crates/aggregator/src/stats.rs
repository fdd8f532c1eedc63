//! The Stats Model: persistent-derived fields rehydrated from the
//! durable store, plus ephemeral fields scoped to this process.
//!
//! Guarded by a plain `RwLock` rather than an async lock — the
//! Consumer is the only writer and holds the lock only long enough to
//! bump a counter, so there is never a reason for a reader to suspend
//! the executor waiting on it.

use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Instant;

use serde::Serialize;

struct Inner {
    received: u64,
    unique_processed: u64,
    duplicate_dropped: u64,
    topics: HashSet<String>,
}

pub struct Stats {
    inner: RwLock<Inner>,
    start_time: Instant,
}

/// A consistent point-in-time view, safe to serialize directly as the
/// `GET /stats` response body.
#[derive(Debug, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub unique_processed: u64,
    pub duplicate_dropped: u64,
    pub topics: Vec<String>,
    pub uptime: String,
}

impl Stats {
    /// Build the Stats Model at startup from the durable store's
    /// rehydrated count and topic set. Ephemeral counters start at
    /// zero and `start_time` is now.
    pub fn new(unique_processed: u64, topics: HashSet<String>) -> Self {
        Stats {
            inner: RwLock::new(Inner {
                received: 0,
                unique_processed,
                duplicate_dropped: 0,
                topics,
            }),
            start_time: Instant::now(),
        }
    }

    /// Called by the HTTP intake for each event accepted into the
    /// queue.
    pub fn on_received(&self, count: u64) {
        self.inner.write().unwrap().received += count;
    }

    /// Called by the Consumer when a commit returns `New`.
    pub fn on_unique(&self, topic: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.unique_processed += 1;
        inner.topics.insert(topic.to_string());
    }

    /// Called by the Consumer when a commit returns `Duplicate`.
    pub fn on_duplicate(&self) {
        self.inner.write().unwrap().duplicate_dropped += 1;
    }

    /// A torn-read-free snapshot of every field, for `GET /stats`.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.read().unwrap();
        StatsSnapshot {
            received: inner.received,
            unique_processed: inner.unique_processed,
            duplicate_dropped: inner.duplicate_dropped,
            topics: inner.topics.iter().cloned().collect(),
            uptime: format!("{:.2}s", self.start_time.elapsed().as_secs_f64()),
        }
    }
}
