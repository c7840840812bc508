#![forbid(unsafe_code)]

//! Core domain model and business logic for the trt therapy tracker.
//!
//! This crate provides:
//! - Domain types (entries, regimens, derived dose/stats views)
//! - The pure entity store (state transitions)
//! - The schedule projector and statistics aggregator
//! - Persistence (JSON state file, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod query;
pub mod schedule;
pub mod stats;
pub mod storage;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{apply, Action};
pub use schedule::upcoming_doses;
pub use stats::snapshot;
pub use export::export_entries;
