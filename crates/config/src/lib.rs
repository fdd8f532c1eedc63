//! Configuration for the aggregator service, loaded from environment
//! variables.
//!
//! `DATABASE_FILE` is deliberately NOT part of this struct: the store
//! path is resolved fresh on every access (see `aggregator_common::db`)
//! so test harnesses can rebind it per run without touching a cached
//! config value. The bind address is likewise not configurable here —
//! per the CLI contract the server always binds `0.0.0.0:8080`.

use anyhow::Result;
use serde::Deserialize;
use std::env;

/// Fixed bind address. Not overridable via environment or flags — the
/// CLI contract names no other bind option.
pub const BIND_ADDR: &str = "0.0.0.0:8080";

const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
const DEFAULT_SHUTDOWN_DRAIN_SECS: u64 = 10;

/// Runtime configuration for the aggregator binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Capacity of the bounded ingestion queue between HTTP intake and
    /// the Consumer.
    pub queue_capacity: usize,
    /// How long shutdown waits for the Consumer to drain the queue
    /// before giving up.
    pub shutdown_drain_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// a `.env` file in the working directory if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            queue_capacity: env::var("AGGREGATOR_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            shutdown_drain_secs: env::var("AGGREGATOR_SHUTDOWN_DRAIN_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SHUTDOWN_DRAIN_SECS),
        })
    }

    /// The address the HTTP listener binds to. Fixed per the CLI
    /// contract.
    pub fn bind_addr(&self) -> &'static str {
        BIND_ADDR
    }
}
