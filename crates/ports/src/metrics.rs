//! Metering backend boundary contract.
//!
//! A provider builds named instruments on request. The facade in `app` caches
//! what it builds per provider generation, so providers are free to return a
//! fresh object on every call.

use scantel_domain::{Attribute, InstrumentSpec};
use scantel_shared::Result;
use std::sync::Arc;

/// Monotonic counter bound to one provider.
pub trait CounterInstrument: Send + Sync {
    /// Add `value` with the given attributes.
    fn add(&self, value: u64, attributes: &[Attribute]);
}

/// Distribution recorder bound to one provider.
pub trait HistogramInstrument: Send + Sync {
    /// Record one observation with the given attributes.
    fn record(&self, value: f64, attributes: &[Attribute]);
}

/// Swappable metering backend.
pub trait MeterProviderPort: Send + Sync {
    /// Stable identifier for logs (`in_memory`, `noop`, `otlp`, ...).
    fn provider_id(&self) -> &str;

    /// Build a counter. Rejection surfaces as `telemetry:instrument_creation`.
    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>>;

    /// Build a histogram. Rejection surfaces as `telemetry:instrument_creation`.
    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>>;

    /// Flush pending data and release backend resources.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
