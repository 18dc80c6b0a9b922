//! Recording meter provider for facade and instrument tests.

use parking_lot::Mutex;
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, InstrumentSpec, MeterProviderPort,
};
use scantel_shared::{ErrorEnvelope, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// A recorded counter increment.
pub type CounterSample = (u64, Vec<Attribute>);
/// A recorded histogram observation.
pub type HistogramSample = (f64, Vec<Attribute>);

#[derive(Default)]
struct Recorded {
    creations: BTreeMap<String, usize>,
    counters: BTreeMap<String, Vec<CounterSample>>,
    histograms: BTreeMap<String, Vec<HistogramSample>>,
    rejected: BTreeSet<String>,
    fail_next: usize,
    shutdown_calls: usize,
    shutdown_error: Option<ErrorEnvelope>,
}

/// Provider that keeps every creation and sample for inspection.
pub struct RecordingMeterProvider {
    id: String,
    creation_delay: Option<Duration>,
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingMeterProvider {
    /// Provider reporting `id` from `provider_id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            creation_delay: None,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    /// Sleep inside every successful creation, widening first-use races.
    pub fn with_creation_delay(mut self, delay: Duration) -> Self {
        self.creation_delay = Some(delay);
        self
    }

    /// Always refuse to build instruments named `name`.
    pub fn reject(&self, name: &str) {
        self.recorded.lock().rejected.insert(name.to_string());
    }

    /// Refuse the next `count` creations, whatever their name.
    pub fn fail_next_creations(&self, count: usize) {
        self.recorded.lock().fail_next = count;
    }

    /// Make `shutdown` return `error`.
    pub fn fail_shutdown(&self, error: ErrorEnvelope) {
        self.recorded.lock().shutdown_error = Some(error);
    }

    /// Successful creations for `name` (counters and histograms combined).
    pub fn creations(&self, name: &str) -> usize {
        self.recorded
            .lock()
            .creations
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Successful creations across all names.
    pub fn total_creations(&self) -> usize {
        self.recorded.lock().creations.values().sum()
    }

    /// Every increment recorded on counter `name`.
    pub fn counter_samples(&self, name: &str) -> Vec<CounterSample> {
        self.recorded
            .lock()
            .counters
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Sum of increments on counter `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counter_samples(name)
            .iter()
            .map(|(value, _)| value)
            .sum()
    }

    /// Every observation recorded on histogram `name`.
    pub fn histogram_samples(&self, name: &str) -> Vec<HistogramSample> {
        self.recorded
            .lock()
            .histograms
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `shutdown` calls.
    pub fn shutdown_calls(&self) -> usize {
        self.recorded.lock().shutdown_calls
    }

    fn admit(&self, spec: &InstrumentSpec) -> Result<String> {
        let name = spec.name.as_str().to_string();
        {
            let mut recorded = self.recorded.lock();
            if recorded.rejected.contains(&name) {
                return Err(ErrorEnvelope::instrument_creation(
                    &name,
                    format!("{} rejected {name}", self.id),
                ));
            }
            if recorded.fail_next > 0 {
                recorded.fail_next -= 1;
                return Err(ErrorEnvelope::parse(format!(
                    "{} failed to create {name}",
                    self.id
                )));
            }
        }
        if let Some(delay) = self.creation_delay {
            std::thread::sleep(delay);
        }
        *self
            .recorded
            .lock()
            .creations
            .entry(name.clone())
            .or_default() += 1;
        Ok(name)
    }
}

struct RecordingCounter {
    name: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl CounterInstrument for RecordingCounter {
    fn add(&self, value: u64, attributes: &[Attribute]) {
        self.recorded
            .lock()
            .counters
            .entry(self.name.clone())
            .or_default()
            .push((value, attributes.to_vec()));
    }
}

struct RecordingHistogram {
    name: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl HistogramInstrument for RecordingHistogram {
    fn record(&self, value: f64, attributes: &[Attribute]) {
        self.recorded
            .lock()
            .histograms
            .entry(self.name.clone())
            .or_default()
            .push((value, attributes.to_vec()));
    }
}

impl MeterProviderPort for RecordingMeterProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>> {
        let name = self.admit(spec)?;
        Ok(Arc::new(RecordingCounter {
            name,
            recorded: Arc::clone(&self.recorded),
        }))
    }

    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>> {
        let name = self.admit(spec)?;
        Ok(Arc::new(RecordingHistogram {
            name,
            recorded: Arc::clone(&self.recorded),
        }))
    }

    fn shutdown(&self) -> Result<()> {
        let mut recorded = self.recorded.lock();
        recorded.shutdown_calls += 1;
        recorded.shutdown_error.clone().map_or(Ok(()), Err)
    }
}
