//! Domain types shared between the aggregator's HTTP, queue, and store
//! layers.

pub mod event;

pub use event::{CommitOutcome, Event, ProcessedRecord};
