//! Telemetry composition root.
//!
//! A [`TelemetryContext`] owns one metrics facade and one exporter registry.
//! Entry points build it once and pass it down; tests build a fresh one.

use crate::observability::{LoggingSettings, build_logger};
use scantel_adapters::host::ProcStatReader;
use scantel_adapters::metrics::InMemoryMeterProvider;
use scantel_adapters::snapshot_store::AtomicFileSnapshotStore;
use scantel_app::{
    ExporterDeps, ExporterRegistry, ExporterSettings, MetricsFacade, ResourceExporter,
};
use scantel_config::ExporterConfig;
use scantel_ports::{CpuTimesPort, LoggerPort, MeterProviderPort};
use scantel_shared::{ErrorCode, Result};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "otlp")]
use scantel_config::ValidatedMetricsConfig;
#[cfg(feature = "otlp")]
use scantel_shared::ErrorEnvelope;

/// Process-level telemetry wiring.
pub struct TelemetryContext {
    logger: Arc<dyn LoggerPort>,
    facade: MetricsFacade,
    exporters: ExporterRegistry,
    remote_setup: OnceLock<Result<u64>>,
}

impl TelemetryContext {
    /// Context whose facade and exporters log through `logger`.
    pub fn new(logger: Arc<dyn LoggerPort>) -> Self {
        Self {
            facade: MetricsFacade::new().with_logger(Arc::clone(&logger)),
            exporters: ExporterRegistry::new().with_logger(Arc::clone(&logger)),
            logger,
            remote_setup: OnceLock::new(),
        }
    }

    /// Context using the logger selected by `SCANTEL_LOG_FORMAT`/`SCANTEL_LOG_LEVEL`.
    pub fn from_std_env() -> Self {
        Self::new(build_logger(&LoggingSettings::from_std_env()))
    }

    /// Logger shared by every component of this context.
    pub fn logger(&self) -> &Arc<dyn LoggerPort> {
        &self.logger
    }

    /// Metrics facade.
    pub const fn facade(&self) -> &MetricsFacade {
        &self.facade
    }

    /// Exporter registry.
    pub const fn exporters(&self) -> &ExporterRegistry {
        &self.exporters
    }

    /// Install any provider. Returns the new generation.
    pub fn install_provider(&self, provider: Arc<dyn MeterProviderPort>) -> u64 {
        self.facade.install(provider)
    }

    /// Install a fresh in-memory registry and return a handle for rendering.
    pub fn install_in_memory(&self) -> InMemoryMeterProvider {
        let provider = InMemoryMeterProvider::new();
        self.facade.install(Arc::new(provider.clone()));
        provider
    }

    /// Build the OTLP provider from `config` and install it.
    ///
    /// Runs at most once per context. Concurrent callers block until the
    /// first setup finishes; every later call, including after a facade
    /// shutdown, returns `telemetry:already_initialized`.
    #[cfg(feature = "otlp")]
    pub fn connect_remote(&self, config: &ValidatedMetricsConfig) -> Result<u64> {
        let mut ran_here = false;
        let outcome = self.remote_setup.get_or_init(|| {
            ran_here = true;
            scantel_adapters::metrics::OtelMeterProvider::connect(config)
                .map(|provider| self.facade.install(Arc::new(provider)))
        });
        if ran_here {
            return outcome.clone();
        }
        let previous = if outcome.is_ok() { "ok" } else { "error" };
        Err(
            ErrorEnvelope::already_initialized("remote metrics setup already ran for this context")
                .with_metadata("previousOutcome", previous),
        )
    }

    /// Returns true once remote setup has been attempted.
    pub fn remote_setup_attempted(&self) -> bool {
        self.remote_setup.get().is_some()
    }

    /// Start the exporter from config, reading the host's `/proc/stat`.
    pub fn init_exporter(&self, config: &ExporterConfig) -> Result<Arc<ResourceExporter>> {
        self.init_exporter_with_cpu(config, Arc::new(ProcStatReader::system()))
    }

    /// Start the exporter from config with an explicit CPU source.
    pub fn init_exporter_with_cpu(
        &self,
        config: &ExporterConfig,
        cpu_times: Arc<dyn CpuTimesPort>,
    ) -> Result<Arc<ResourceExporter>> {
        let settings = ExporterSettings::new(&config.directory, &config.file_prefix)?;
        self.exporters.init(
            settings,
            ExporterDeps {
                store: Arc::new(AtomicFileSnapshotStore::new()),
                cpu_times,
            },
        )
    }

    /// Shut down the facade, then the exporter if one is running.
    ///
    /// The exporter is released even when the provider flush fails; the
    /// first error is returned.
    pub fn shutdown(&self) -> Result<()> {
        let facade = self.facade.shutdown();
        let exporter = match self.exporters.shutdown() {
            Err(error) if error.has_code(&ErrorCode::not_initialized()) => Ok(()),
            other => other,
        };
        facade.and(exporter)
    }
}
