//! # scantel-app
//!
//! Telemetry core: the swappable metrics facade, the fixed domain
//! instruments recorded through it, and the on-disk resource exporter with
//! its built-in CPU collector.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod cpu;
pub mod exporter;
pub mod facade;
pub mod instruments;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use cpu::{CPU_COLLECTOR_NAME, CpuCollector};
pub use exporter::{
    DEFAULT_FILE_PREFIX, ExporterDeps, ExporterRegistry, ExporterSettings, ResourceExporter,
};
pub use facade::{FacadeStatus, MetricsFacade};
pub use instruments::{
    CATALOG_REQUEST_DURATION, FILTER_DURATION, FILTERED_BYTES, METADATA_FETCH_DURATION,
    OBJECT_STORE_BYTES, OBJECT_STORE_REQUEST_DURATION, PLAN_TRANSFER_BYTES,
    PLAN_TRANSFER_DURATION, domain_instrument_specs,
};

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_domain::domain_crate_version;
    use scantel_ports::ports_crate_version;
    use scantel_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        let version = app_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
