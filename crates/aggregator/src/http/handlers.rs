use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use aggregator_domain::event::Event;

use crate::dedup::DedupStore;
use crate::error::AppError;
use crate::stats::{Stats, StatsSnapshot};

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    pub count: usize,
}

/// `POST /publish` — validate the batch, enqueue each event, return
/// once the whole batch has been handed to the queue.
///
/// A malformed element never reaches this handler: the `Json`
/// extractor rejects the request with 422 before deserialization
/// produces an `Event`. Only the empty-array case is checked here.
pub async fn publish(
    State(queue): State<mpsc::Sender<Event>>,
    State(stats): State<Arc<Stats>>,
    Json(events): Json<Vec<Event>>,
) -> Result<Json<PublishResponse>, AppError> {
    if events.is_empty() {
        return Err(AppError::EmptyBatch);
    }

    let count = events.len();
    stats.on_received(count as u64);

    for event in events {
        // A full queue applies backpressure, not failure: this await
        // suspends until the Consumer makes room.
        if queue.send(event).await.is_err() {
            // The Consumer has shut down; nothing left to hand events to.
            break;
        }
    }

    info!(count, "batch queued");
    Ok(Json(PublishResponse {
        status: "events queued",
        count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub topic: String,
    pub events: Vec<aggregator_domain::event::ProcessedRecord>,
}

/// `GET /events?topic=T` — reads straight from the processed table,
/// independent of the Consumer path.
pub async fn events(
    State(store): State<DedupStore>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, AppError> {
    let records = store.list_by_topic(&query.topic).await?;
    Ok(Json(EventsResponse {
        topic: query.topic,
        events: records,
    }))
}

/// `GET /stats` — touches only the in-memory Stats Model, never the
/// dedup table.
pub async fn stats(State(stats): State<Arc<Stats>>) -> Json<StatsSnapshot> {
    Json(stats.snapshot())
}

/// `GET /health` — liveness only.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
