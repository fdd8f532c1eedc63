//! SQLite connection helpers for the durable dedup store
//!
//! The store path is resolved from `DATABASE_FILE` on every call rather
//! than cached, so test harnesses can rebind it per run (see
//! [`database_file`]). Connections are opened fresh per call; the
//! aggregator has exactly one writer (the Consumer), so there is no pool
//! contention to amortize.

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::env;
use std::str::FromStr;
use tracing::info;

use crate::error::Result;

/// Default database file name, used when `DATABASE_FILE` is unset.
pub const DEFAULT_DATABASE_FILE: &str = "aggregator.db";

/// Resolve the current store path from `DATABASE_FILE`.
///
/// Read fresh on every call (not cached at startup) so that per-test
/// environment overrides take effect immediately.
pub fn database_file() -> String {
    env::var("DATABASE_FILE").unwrap_or_else(|_| DEFAULT_DATABASE_FILE.to_string())
}

/// Open a new connection to the current `DATABASE_FILE`, creating it if
/// it doesn't exist.
pub async fn connect() -> Result<SqliteConnection> {
    let path = database_file();
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
        .map_err(sqlx::Error::from)?
        .create_if_missing(true);

    Ok(SqliteConnection::connect_with(&options).await?)
}

/// Create the dedup store's tables if they don't already exist.
///
/// Idempotent — safe to call on every startup, mirroring the original
/// `init_db()` behavior.
pub async fn ensure_schema() -> Result<()> {
    let path = database_file();
    info!(database_file = %path, "Ensuring dedup store schema");

    let mut conn = connect().await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dedup_store (
            topic TEXT NOT NULL,
            event_id TEXT NOT NULL,
            processed_at TIMESTAMP NOT NULL,
            PRIMARY KEY (topic, event_id)
        )",
    )
    .execute(&mut conn)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS processed_events (
            topic TEXT NOT NULL,
            event_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            source TEXT NOT NULL,
            payload TEXT NOT NULL,
            UNIQUE(topic, event_id)
        )",
    )
    .execute(&mut conn)
    .await?;

    Ok(())
}
