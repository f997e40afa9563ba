//! auction-watch: adaptive polling engine for marketplace auction listings
//!
//! This library provides the core components for:
//! - Single-listing lookups against the marketplace item-detail API
//! - Remaining-time parsing and a deadline-driven poll interval policy
//! - Per-subscriber watch groups, each polled by one background task
//! - A registry that creates and retires groups as watches come and go
//! - Change/ended events for an external rendering layer
//! - Structured logging and metrics

pub mod cli;
pub mod config;
pub mod listing;
pub mod telemetry;
pub mod watch;
