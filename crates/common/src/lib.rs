//! # Aggregator Common Library
//!
//! Shared utilities and infrastructure code used by the aggregator service
//! and its supporting tools.
//!
//! This crate provides:
//! - SQLite connection helpers for the durable dedup store
//! - Custom error types
//! - Structured logging setup

// Module declarations
pub mod db;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use db::{database_file, ensure_schema};
pub use error::{Error, Result};
pub use logging::init_tracing;
