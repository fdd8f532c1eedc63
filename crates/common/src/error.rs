//! Error types shared across the aggregator crates
//!
//! Custom error enum that wraps all possible error types in the application.

use thiserror::Error;

/// Main error type for aggregator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Database errors (SQLite via sqlx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for aggregator operations
pub type Result<T> = std::result::Result<T, Error>;
