//! HTTP-facing error type. Store errors never reach a handler directly
//! — events are handed off to the queue before any commit is
//! attempted — so this type only needs to cover request validation and
//! the read paths (`GET /events`, `GET /stats`).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Event list tidak boleh kosong")]
    EmptyBatch,

    #[error(transparent)]
    Store(#[from] aggregator_common::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::EmptyBatch => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
