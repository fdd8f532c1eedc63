//! The event shapes that flow through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event as it arrives over `POST /publish`.
///
/// All five fields are required; a missing or mistyped field fails
/// deserialization before the event ever reaches the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub event_id: String,
    /// ISO-8601 string, stored verbatim and never parsed by this crate.
    pub timestamp: String,
    pub source: String,
    pub payload: Value,
}

/// A row from the processed-events table, as served by `GET /events`.
///
/// `FromRow` lets the store read these straight back via
/// `sqlx::query_as`; `payload` is wrapped in `sqlx::types::Json` since
/// SQLite has no native JSON column type — the wrapper decodes the
/// stored TEXT and serializes back out exactly as the inner `Value`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedRecord {
    pub topic: String,
    pub event_id: String,
    pub timestamp: String,
    pub source: String,
    pub payload: sqlx::types::Json<Value>,
}

/// The result of attempting to commit an event to the dedup store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The `(topic, event_id)` pair was not seen before; both tables now
    /// carry a row for it.
    New,
    /// The dedup table already held this identity; no write occurred.
    Duplicate,
}
