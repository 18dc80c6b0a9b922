//! Resource snapshot exporter.
//!
//! A [`ResourceExporter`] gathers samples from its ordered collectors and
//! publishes them as one exposition file per stage. [`ExporterRegistry`] is
//! the single slot an entry point owns to init, use, and shut down the
//! exporter.

use crate::cpu::CpuCollector;
use parking_lot::Mutex;
use scantel_domain::{Stage, render_exposition};
use scantel_ports::{Collector, CpuTimesPort, LoggerPort, SnapshotStorePort, log_fields};
use scantel_shared::{ErrorCode, ErrorEnvelope, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix used when the configured prefix is blank.
pub const DEFAULT_FILE_PREFIX: &str = "scantel";

/// Normalized exporter location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterSettings {
    directory: PathBuf,
    prefix: String,
}

impl ExporterSettings {
    /// Trim both values; a blank prefix becomes [`DEFAULT_FILE_PREFIX`].
    ///
    /// A blank directory fails with `config:missing_directory`; a prefix with
    /// a path separator or whitespace fails with `config:invalid_prefix`.
    pub fn new(directory: &str, prefix: &str) -> Result<Self> {
        let directory = directory.trim();
        if directory.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "missing_directory"),
                "exporter directory must be set",
            ));
        }

        let prefix = match prefix.trim() {
            "" => DEFAULT_FILE_PREFIX,
            trimmed => trimmed,
        };
        if prefix
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_prefix"),
                "exporter file prefix must not contain path separators or whitespace",
            )
            .with_metadata("prefix", prefix));
        }

        Ok(Self {
            directory: PathBuf::from(directory),
            prefix: prefix.to_string(),
        })
    }

    /// Target directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File-name prefix, also used for CPU metric names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Adapters the exporter needs.
#[derive(Clone)]
pub struct ExporterDeps {
    /// Atomic snapshot storage.
    pub store: Arc<dyn SnapshotStorePort>,
    /// Source for the built-in CPU collector.
    pub cpu_times: Arc<dyn CpuTimesPort>,
}

/// Snapshot writer bound to one directory and prefix.
pub struct ResourceExporter {
    settings: ExporterSettings,
    store: Arc<dyn SnapshotStorePort>,
    // Held across collection, rendering, and publish.
    collectors: Mutex<Vec<Arc<dyn Collector>>>,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl ResourceExporter {
    /// Exporter whose collector list starts with the CPU collector.
    pub fn new(
        settings: ExporterSettings,
        deps: ExporterDeps,
        logger: Option<Arc<dyn LoggerPort>>,
    ) -> Self {
        let cpu: Arc<dyn Collector> =
            Arc::new(CpuCollector::new(settings.prefix.clone(), deps.cpu_times));
        Self {
            settings,
            store: deps.store,
            collectors: Mutex::new(vec![cpu]),
            logger,
        }
    }

    /// Target directory.
    pub fn directory(&self) -> &Path {
        self.settings.directory()
    }

    /// File-name prefix.
    pub fn prefix(&self) -> &str {
        self.settings.prefix()
    }

    /// Collector names in rendering order.
    pub fn collector_names(&self) -> Vec<String> {
        self.collectors
            .lock()
            .iter()
            .map(|collector| collector.name().to_string())
            .collect()
    }

    /// Append a collector. A blank name is rejected with `core:invalid_input`.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        validate_collector(collector.as_ref())?;
        self.collectors.lock().push(collector);
        Ok(())
    }

    /// Collect, render, and atomically publish a snapshot for `stage`.
    ///
    /// Returns the published path. If a collector fails nothing is written
    /// and the error is `telemetry:collector_failed` naming that collector.
    pub fn write_snapshot(&self, stage: &str) -> Result<PathBuf> {
        let stage = Stage::parse(stage)?;
        let collectors = self.collectors.lock();

        let mut metrics = Vec::new();
        for collector in collectors.iter() {
            let samples = collector.collect(&stage).map_err(|cause| {
                let error = ErrorEnvelope::collector_failed(collector.name(), cause);
                self.log_collector_failure(&error, collector.name(), &stage);
                error
            })?;
            metrics.extend(samples);
        }

        let document = render_exposition(&metrics, &stage);
        let path = self.store.publish(
            self.settings.directory(),
            &stage.file_name(self.settings.prefix()),
            document.as_bytes(),
        )?;
        drop(collectors);

        if let Some(logger) = self.logger.as_ref() {
            logger.debug(
                "exporter.snapshot_written",
                "Resource snapshot written",
                Some(log_fields([
                    ("path", Value::from(path.to_string_lossy().into_owned())),
                    ("stage", Value::from(stage.as_str())),
                    ("metrics", Value::from(metrics.len())),
                ])),
            );
        }
        Ok(path)
    }

    fn log_collector_failure(&self, error: &ErrorEnvelope, collector: &str, stage: &Stage) {
        if let Some(logger) = self.logger.as_ref() {
            logger.warn(
                "exporter.collector_failed",
                &error.message,
                Some(log_fields([
                    ("collector", Value::from(collector)),
                    ("stage", Value::from(stage.as_str())),
                    ("code", Value::from(error.code.to_string())),
                ])),
            );
        }
    }
}

fn validate_collector(collector: &dyn Collector) -> Result<()> {
    if collector.name().trim().is_empty() {
        return Err(ErrorEnvelope::invalid_argument(
            "collector must have a non-empty name",
        ));
    }
    Ok(())
}

/// Owner of the single active exporter.
#[derive(Default)]
pub struct ExporterRegistry {
    slot: Mutex<Option<Arc<ResourceExporter>>>,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl ExporterRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a logger, also handed to exporters created by [`Self::init`].
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create the target directory and install an exporter.
    ///
    /// Fails with `telemetry:already_initialized` if one is installed, or
    /// with an I/O error if the directory cannot be created.
    pub fn init(
        &self,
        settings: ExporterSettings,
        deps: ExporterDeps,
    ) -> Result<Arc<ResourceExporter>> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(ErrorEnvelope::already_initialized(
                "resource exporter already initialized",
            ));
        }

        deps.store.ensure_directory(settings.directory())?;
        let exporter = Arc::new(ResourceExporter::new(settings, deps, self.logger.clone()));
        *slot = Some(Arc::clone(&exporter));
        drop(slot);

        if let Some(logger) = self.logger.as_ref() {
            logger.info(
                "exporter.init",
                "Resource exporter initialized",
                Some(log_fields([
                    (
                        "directory",
                        Value::from(exporter.directory().to_string_lossy().into_owned()),
                    ),
                    ("prefix", Value::from(exporter.prefix())),
                ])),
            );
        }
        Ok(exporter)
    }

    /// Release the installed exporter. In-flight snapshots on it complete.
    pub fn shutdown(&self) -> Result<()> {
        let Some(exporter) = self.slot.lock().take() else {
            return Err(not_initialized());
        };
        if let Some(logger) = self.logger.as_ref() {
            logger.info(
                "exporter.shutdown",
                "Resource exporter shut down",
                Some(log_fields([("prefix", Value::from(exporter.prefix()))])),
            );
        }
        Ok(())
    }

    /// Append a collector to the installed exporter.
    pub fn register_collector(&self, collector: Arc<dyn Collector>) -> Result<()> {
        validate_collector(collector.as_ref())?;
        self.current().ok_or_else(not_initialized)?.register(collector)
    }

    /// Write a snapshot through the installed exporter.
    pub fn write_snapshot(&self, stage: &str) -> Result<PathBuf> {
        self.current()
            .ok_or_else(not_initialized)?
            .write_snapshot(stage)
    }

    /// Handle to the installed exporter, if any.
    pub fn current(&self) -> Option<Arc<ResourceExporter>> {
        self.slot.lock().clone()
    }
}

fn not_initialized() -> ErrorEnvelope {
    ErrorEnvelope::not_initialized("resource exporter not initialized")
}
