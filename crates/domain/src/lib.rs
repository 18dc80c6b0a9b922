//! # scantel-domain
//!
//! Telemetry value types with no infrastructure dependencies:
//!
//! - **Attributes** - `Attribute` and the packed `k=v;k=v` codec
//! - **Primitives** - `InstrumentName`, `Stage`
//! - **Instruments** - `InstrumentSpec`, `InstrumentKind`, `Outcome`
//! - **Metrics** - `Metric`, `MetricKind`, `CpuTimes`
//! - **Exposition** - text rendering of metric snapshots
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - Pure logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use scantel_shared::shared_crate_version;

pub mod attributes;
pub mod exposition;
pub mod instrument;
pub mod metric;
pub mod primitives;

pub use attributes::{Attribute, parse_attribute_string};
pub use exposition::{escape_help, escape_label_value, format_sample_value, render_exposition};
pub use instrument::{InstrumentKind, InstrumentSpec, Outcome};
pub use metric::{CpuTimes, Labels, Metric, MetricKind};
pub use primitives::{InstrumentName, PrimitiveError, Stage};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        assert!(!domain_crate_version().is_empty());
    }

    #[test]
    fn domain_depends_on_shared() {
        assert_eq!(shared_crate_version(), domain_crate_version());
    }
}
