//! The single long-lived worker that drains the Ingestion Queue and
//! commits each event to the Dedup Store.

use std::sync::Arc;

use aggregator_domain::event::{CommitOutcome, Event};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dedup::DedupStore;
use crate::stats::Stats;

/// Commit attempts for a non-duplicate failure before the event is
/// dropped from the in-process pipeline. A producer retry is the
/// recovery path past this point.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

pub struct Consumer {
    queue: mpsc::Receiver<Event>,
    store: DedupStore,
    stats: Arc<Stats>,
}

impl Consumer {
    pub fn new(queue: mpsc::Receiver<Event>, store: DedupStore, stats: Arc<Stats>) -> Self {
        Consumer { queue, store, stats }
    }

    /// Dequeue one event, commit it, update stats, repeat. Returns
    /// once the channel's senders have all dropped and the queue is
    /// drained — this is what the shutdown drain deadline races
    /// against.
    pub async fn run(mut self) {
        info!("Consumer started");

        while let Some(event) = self.queue.recv().await {
            self.process(event).await;
        }

        info!("Consumer stopped: queue closed and drained");
    }

    async fn process(&self, event: Event) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.commit(&event).await {
                Ok(CommitOutcome::New) => {
                    self.stats.on_unique(&event.topic);
                    debug!(topic = %event.topic, event_id = %event.event_id, "committed new event");
                    return;
                }
                Ok(CommitOutcome::Duplicate) => {
                    self.stats.on_duplicate();
                    info!("[DUPLICATE] {}/{}", event.topic, event.event_id);
                    return;
                }
                Err(e) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(
                        topic = %event.topic,
                        event_id = %event.event_id,
                        attempt,
                        error = %e,
                        "commit failed, retrying"
                    );
                }
                Err(e) => {
                    error!(
                        topic = %event.topic,
                        event_id = %event.event_id,
                        error = %e,
                        "commit failed after {} attempts, dropping event from pipeline",
                        attempt
                    );
                    return;
                }
            }
        }
    }
}
