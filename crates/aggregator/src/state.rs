use std::sync::Arc;

use tokio::sync::mpsc;

use aggregator_domain::event::Event;

use crate::dedup::DedupStore;
use crate::stats::Stats;

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DedupStore,
    pub stats: Arc<Stats>,
    pub queue: mpsc::Sender<Event>,
}

impl axum::extract::FromRef<AppState> for DedupStore {
    fn from_ref(state: &AppState) -> Self {
        state.store
    }
}

impl axum::extract::FromRef<AppState> for Arc<Stats> {
    fn from_ref(state: &AppState) -> Self {
        state.stats.clone()
    }
}

impl axum::extract::FromRef<AppState> for mpsc::Sender<Event> {
    fn from_ref(state: &AppState) -> Self {
        state.queue.clone()
    }
}
