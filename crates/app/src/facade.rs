//! Process-wide metrics facade over a swappable meter provider.
//!
//! Each [`MetricsFacade::install`] starts a new generation: a provider plus
//! its own counter and histogram caches. Recording clones the current
//! generation out of the state lock and then works lock-free against it, so
//! an install never blocks on in-flight records and a record never observes a
//! half-built generation.

use crate::instruments::DomainInstruments;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use scantel_domain::{InstrumentName, InstrumentSpec, PrimitiveError};
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, LoggerPort, MeterProviderPort, log_fields,
};
use scantel_shared::{ErrorCode, ErrorEnvelope, Result};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observable lifecycle state of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeStatus {
    /// No provider installed.
    Uninitialized,
    /// A provider is installed.
    Ready {
        /// Generation id returned by the install.
        generation: u64,
    },
    /// `shutdown` is flushing the provider.
    ShuttingDown,
}

enum FacadeState {
    Uninitialized,
    Ready(Arc<Generation>),
    ShuttingDown,
}

pub(crate) struct Generation {
    id: u64,
    provider: Arc<dyn MeterProviderPort>,
    counters: DashMap<Box<str>, Arc<dyn CounterInstrument>>,
    histograms: DashMap<Box<str>, Arc<dyn HistogramInstrument>>,
    pub(crate) domain: DomainInstruments,
}

impl Generation {
    fn counter(&self, name: &InstrumentName) -> Result<Arc<dyn CounterInstrument>> {
        resolve(&self.counters, name, || {
            self.provider.counter(&InstrumentSpec::counter(name.clone()))
        })
    }

    fn histogram(&self, name: &InstrumentName) -> Result<Arc<dyn HistogramInstrument>> {
        resolve(&self.histograms, name, || {
            self.provider
                .histogram(&InstrumentSpec::histogram(name.clone()))
        })
    }
}

/// Look up `name`, creating it at most once per cache on a miss.
///
/// The miss path holds the shard lock of `name` while `create` runs, so
/// concurrent first callers wait for and share one instrument. Failures are
/// returned and never cached.
fn resolve<I: ?Sized>(
    cache: &DashMap<Box<str>, Arc<I>>,
    name: &InstrumentName,
    create: impl FnOnce() -> Result<Arc<I>>,
) -> Result<Arc<I>> {
    if let Some(found) = cache.get(name.as_str()) {
        return Ok(Arc::clone(found.value()));
    }

    let entry = cache
        .entry(name.as_str().into())
        .or_try_insert_with(|| create().map_err(|error| creation_error(name, error)))?;
    Ok(Arc::clone(entry.value()))
}

fn creation_error(name: &InstrumentName, error: ErrorEnvelope) -> ErrorEnvelope {
    if error.has_code(&ErrorCode::instrument_creation()) {
        return error.with_metadata("instrument", name.as_str());
    }
    ErrorEnvelope::instrument_creation(
        name.as_str(),
        format!("create instrument {name}: {}", error.message),
    )
    .with_metadata("causeCode", error.code.to_string())
}

/// Swappable metrics entry point shared by every recording call site.
pub struct MetricsFacade {
    state: RwLock<FacadeState>,
    // Serializes install and shutdown; records never take it.
    lifecycle: Mutex<()>,
    next_generation: AtomicU64,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl Default for MetricsFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsFacade {
    /// Facade with no provider installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(FacadeState::Uninitialized),
            lifecycle: Mutex::new(()),
            next_generation: AtomicU64::new(0),
            logger: None,
        }
    }

    /// Attach a logger for lifecycle events.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replace the active provider and start a new generation.
    ///
    /// The domain instruments are built against `provider` before the swap.
    /// The previous provider is released without being shut down; callers
    /// that own it flush it themselves. Returns the new generation id.
    pub fn install(&self, provider: Arc<dyn MeterProviderPort>) -> u64 {
        let _lifecycle = self.lifecycle.lock();
        let id = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        let counters = DashMap::new();
        let histograms = DashMap::new();
        let domain = DomainInstruments::build(
            provider.as_ref(),
            &counters,
            &histograms,
            self.logger.as_deref(),
        );
        let provider_id = provider.provider_id().to_string();
        let generation = Arc::new(Generation {
            id,
            provider,
            counters,
            histograms,
            domain,
        });

        let previous = std::mem::replace(&mut *self.state.write(), FacadeState::Ready(generation));
        let replaced = match previous {
            FacadeState::Ready(old) => Value::from(old.id),
            FacadeState::Uninitialized | FacadeState::ShuttingDown => Value::Null,
        };

        if let Some(logger) = self.logger.as_ref() {
            logger.info(
                "metrics.install",
                "Meter provider installed",
                Some(log_fields([
                    ("generation", Value::from(id)),
                    ("provider", Value::from(provider_id)),
                    ("replacedGeneration", replaced),
                ])),
            );
        }
        id
    }

    /// Add `delta` to the counter `name`, creating it on first use.
    pub fn counter_add(&self, name: &str, delta: i64, attributes: &[Attribute]) -> Result<()> {
        let name = InstrumentName::parse(name)?;
        let value = u64::try_from(delta).map_err(|_| PrimitiveError::NegativeDelta { delta })?;
        let counter = self.ready_generation()?.counter(&name)?;
        counter.add(value, attributes);
        Ok(())
    }

    /// Record `value` into the histogram `name`, creating it on first use.
    pub fn histogram_record(&self, name: &str, value: f64, attributes: &[Attribute]) -> Result<()> {
        let name = InstrumentName::parse(name)?;
        let histogram = self.ready_generation()?.histogram(&name)?;
        histogram.record(value, attributes);
        Ok(())
    }

    /// Flush and release the active provider.
    ///
    /// `Ready -> ShuttingDown -> Uninitialized`. Records issued meanwhile fail
    /// with `telemetry:not_initialized`. A facade that is not ready returns
    /// `Ok` without doing anything.
    pub fn shutdown(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        let generation = {
            let mut state = self.state.write();
            match std::mem::replace(&mut *state, FacadeState::ShuttingDown) {
                FacadeState::Ready(generation) => generation,
                other => {
                    *state = other;
                    return Ok(());
                },
            }
        };

        let result = generation.provider.shutdown();
        *self.state.write() = FacadeState::Uninitialized;

        if let Some(logger) = self.logger.as_ref() {
            let fields = Some(log_fields([
                ("generation", Value::from(generation.id)),
                ("provider", Value::from(generation.provider.provider_id())),
            ]));
            match result.as_ref() {
                Ok(()) => logger.info("metrics.shutdown", "Meter provider shut down", fields),
                Err(error) => logger.error(
                    "metrics.shutdown",
                    &format!("Meter provider shutdown failed: {error}"),
                    fields,
                ),
            }
        }
        result
    }

    /// Current lifecycle state.
    pub fn status(&self) -> FacadeStatus {
        match &*self.state.read() {
            FacadeState::Uninitialized => FacadeStatus::Uninitialized,
            FacadeState::Ready(generation) => FacadeStatus::Ready {
                generation: generation.id,
            },
            FacadeState::ShuttingDown => FacadeStatus::ShuttingDown,
        }
    }

    /// Active generation id, if a provider is installed.
    pub fn generation(&self) -> Option<u64> {
        match self.status() {
            FacadeStatus::Ready { generation } => Some(generation),
            FacadeStatus::Uninitialized | FacadeStatus::ShuttingDown => None,
        }
    }

    /// Returns true while a provider is installed.
    pub fn is_ready(&self) -> bool {
        self.generation().is_some()
    }

    pub(crate) fn current_generation(&self) -> Option<Arc<Generation>> {
        match &*self.state.read() {
            FacadeState::Ready(generation) => Some(Arc::clone(generation)),
            FacadeState::Uninitialized | FacadeState::ShuttingDown => None,
        }
    }

    fn ready_generation(&self) -> Result<Arc<Generation>> {
        self.current_generation()
            .ok_or_else(|| ErrorEnvelope::not_initialized("no meter provider installed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_testkit::{CapturingLogger, RecordingMeterProvider};

    fn installed() -> (MetricsFacade, Arc<RecordingMeterProvider>) {
        let facade = MetricsFacade::new();
        let provider = Arc::new(RecordingMeterProvider::new("recording"));
        facade.install(provider.clone());
        (facade, provider)
    }

    #[test]
    fn record_before_install_is_not_initialized() {
        let facade = MetricsFacade::new();
        let error = facade.counter_add("scan.rows", 1, &[]).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::not_initialized())
        );
        assert_eq!(facade.status(), FacadeStatus::Uninitialized);
    }

    #[test]
    fn empty_name_is_rejected_before_provider_access() {
        let (facade, provider) = installed();
        let after_install = provider.total_creations();
        for name in ["", "   "] {
            let error = facade.histogram_record(name, 1.0, &[]).err();
            assert_eq!(
                error.map(|error| error.code),
                Some(ErrorCode::invalid_input())
            );
            let error = facade.counter_add(name, 1, &[]).err();
            assert_eq!(
                error.map(|error| error.code),
                Some(ErrorCode::invalid_input())
            );
        }
        assert_eq!(provider.total_creations(), after_install);
    }

    #[test]
    fn negative_delta_records_nothing() {
        let (facade, provider) = installed();
        let error = facade.counter_add("scan.rows", -1, &[]).err();

        assert_eq!(
            error.as_ref().map(|error| &error.code),
            Some(&ErrorCode::invalid_input())
        );
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("delta"))
                .map(String::as_str),
            Some("-1")
        );
        assert_eq!(provider.creations("scan.rows"), 0);
        assert!(provider.counter_samples("scan.rows").is_empty());
    }

    #[test]
    fn cached_instrument_is_reused() -> Result<()> {
        let (facade, provider) = installed();
        let attributes = [Attribute::new("table", "orders")];
        for _ in 0..5 {
            facade.counter_add("scan.rows", 2, &attributes)?;
        }
        assert_eq!(provider.creations("scan.rows"), 1);
        assert_eq!(provider.counter_total("scan.rows"), 10);
        Ok(())
    }

    #[test]
    fn counters_and_histograms_have_separate_caches() -> Result<()> {
        let (facade, provider) = installed();
        facade.counter_add("shared.name", 1, &[])?;
        facade.histogram_record("shared.name", 2.5, &[])?;
        assert_eq!(provider.creations("shared.name"), 2);
        assert_eq!(provider.histogram_samples("shared.name").len(), 1);
        Ok(())
    }

    #[test]
    fn creation_failure_is_not_cached() -> Result<()> {
        let (facade, provider) = installed();
        provider.fail_next_creations(1);

        let error = facade.counter_add("scan.rows", 1, &[]).err();
        assert_eq!(
            error.as_ref().map(|error| &error.code),
            Some(&ErrorCode::instrument_creation())
        );
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("instrument"))
                .map(String::as_str),
            Some("scan.rows")
        );

        facade.counter_add("scan.rows", 1, &[])?;
        assert_eq!(provider.counter_total("scan.rows"), 1);
        Ok(())
    }

    #[test]
    fn install_bumps_generation_and_logs() {
        let logger = Arc::new(CapturingLogger::default());
        let facade = MetricsFacade::new().with_logger(logger.clone());

        let first = facade.install(Arc::new(RecordingMeterProvider::new("a")));
        let second = facade.install(Arc::new(RecordingMeterProvider::new("b")));

        assert!(second > first);
        assert_eq!(facade.generation(), Some(second));
        assert_eq!(logger.count("metrics.install"), 2);
    }

    #[test]
    fn shutdown_flushes_and_uninitializes() -> Result<()> {
        let (facade, provider) = installed();
        facade.shutdown()?;

        assert_eq!(provider.shutdown_calls(), 1);
        assert!(!facade.is_ready());
        assert!(facade.counter_add("scan.rows", 1, &[]).is_err());

        facade.shutdown()?;
        assert_eq!(provider.shutdown_calls(), 1);
        Ok(())
    }

    #[test]
    fn shutdown_surfaces_provider_error() {
        let (facade, provider) = installed();
        provider.fail_shutdown(ErrorEnvelope::invalid_argument("flush refused"));

        assert!(facade.shutdown().is_err());
        assert_eq!(facade.status(), FacadeStatus::Uninitialized);
    }
}
