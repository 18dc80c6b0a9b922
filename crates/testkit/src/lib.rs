//! # scantel-testkit
//!
//! Test doubles for the telemetry ports and access to shared fixtures.
//! This crate depends on `ports` and `shared`.

pub mod collectors;
pub mod errors;
pub mod fixtures;
pub mod in_memory;
pub mod metrics;

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use collectors::{FailingCollector, FixedCpuSource, StubCollector};
pub use in_memory::{CapturingLogger, InMemorySnapshotStore, NoopLogger};
pub use metrics::{CounterSample, HistogramSample, RecordingMeterProvider};
