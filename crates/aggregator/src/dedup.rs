//! The durable dedup store.
//!
//! Every call opens its own connection against the current
//! `DATABASE_FILE` (see [`aggregator_common::db`]); the aggregator has
//! exactly one writer (the [`crate::consumer::Consumer`]), so there is
//! no pool to size.

use aggregator_common::db;
use aggregator_domain::event::{CommitOutcome, Event, ProcessedRecord};
use chrono::Utc;
use sqlx::Connection;
use std::collections::HashSet;

/// Handle to the durable store. Holds no connection of its own; every
/// method opens one fresh, per [`aggregator_common::db::connect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DedupStore;

impl DedupStore {
    pub fn new() -> Self {
        DedupStore
    }

    /// Insert `(topic, event_id)` into the dedup table and the full
    /// record into the processed table, in one transaction.
    ///
    /// The primary-key conflict on `dedup_store` is the sole signal of
    /// duplication — there is no select-then-insert check, since that
    /// would race under concurrent commits.
    pub async fn commit(&self, event: &Event) -> aggregator_common::Result<CommitOutcome> {
        let mut conn = db::connect().await?;
        let mut tx = conn.begin().await.map_err(sqlx::Error::from)?;

        let dedup_insert = sqlx::query(
            "INSERT INTO dedup_store (topic, event_id, processed_at) VALUES (?, ?, ?)",
        )
        .bind(&event.topic)
        .bind(&event.event_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await;

        match dedup_insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await.map_err(sqlx::Error::from)?;
                return Ok(CommitOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        let payload = serde_json::to_string(&event.payload)?;
        sqlx::query(
            "INSERT INTO processed_events (topic, event_id, timestamp, source, payload) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.topic)
        .bind(&event.event_id)
        .bind(&event.timestamp)
        .bind(&event.source)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(sqlx::Error::from)?;
        Ok(CommitOutcome::New)
    }

    /// Read every processed record for a topic. Ordering is
    /// unspecified but stable within a process.
    pub async fn list_by_topic(&self, topic: &str) -> aggregator_common::Result<Vec<ProcessedRecord>> {
        let mut conn = db::connect().await?;

        let records = sqlx::query_as::<_, ProcessedRecord>(
            "SELECT topic, event_id, timestamp, source, payload \
             FROM processed_events WHERE topic = ?",
        )
        .bind(topic)
        .fetch_all(&mut conn)
        .await?;

        Ok(records)
    }

    /// Bootstrap the persistent half of the Stats Model: total row
    /// count and the distinct set of topics ever admitted.
    pub async fn rehydrate(&self) -> aggregator_common::Result<(u64, HashSet<String>)> {
        let mut conn = db::connect().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dedup_store")
            .fetch_one(&mut conn)
            .await?;

        let topic_rows = sqlx::query_scalar::<_, String>("SELECT DISTINCT topic FROM dedup_store")
            .fetch_all(&mut conn)
            .await?;

        Ok((count as u64, topic_rows.into_iter().collect()))
    }
}
