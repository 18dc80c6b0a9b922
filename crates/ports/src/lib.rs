//! # scantel-ports
//!
//! Port traits for the scantel hexagonal architecture.
//!
//! The metering backend, snapshot collectors, host counter source, snapshot
//! storage, and logging are all reached through these traits. This crate
//! depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod collector;
pub mod logger;
pub mod metrics;
pub mod snapshot_store;

pub use collector::*;
pub use logger::*;
pub use metrics::*;
pub use snapshot_store::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without naming `scantel-domain` for them.
pub use scantel_domain::{Attribute, CpuTimes, InstrumentKind, InstrumentSpec, Metric, Stage};
