//! Pull-style registry provider rendered as text exposition.

use super::validate_instrument_name;
use parking_lot::Mutex;
use scantel_domain::{Metric, Stage, escape_help, escape_label_value, format_sample_value};
use scantel_ports::{
    Attribute, Collector, CounterInstrument, HistogramInstrument, InstrumentKind, InstrumentSpec,
    MeterProviderPort,
};
use scantel_shared::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

type SeriesKey = BTreeMap<String, String>;

#[derive(Debug, Default, Clone, Copy)]
struct HistogramState {
    count: u64,
    sum: f64,
}

impl HistogramState {
    fn count_f64(&self) -> f64 {
        as_f64(self.count)
    }

    const fn sum(&self) -> f64 {
        self.sum
    }
}

struct Family<T> {
    help: String,
    series: BTreeMap<SeriesKey, T>,
}

impl<T> Family<T> {
    fn new(spec: &InstrumentSpec) -> Self {
        Self {
            help: spec.description.to_string(),
            series: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
struct Registry {
    counters: BTreeMap<String, Family<u64>>,
    histograms: BTreeMap<String, Family<HistogramState>>,
}

/// Provider that accumulates samples in memory for later rendering.
///
/// Creating the same name twice returns instruments sharing one series set.
/// Registered as a [`Collector`], the current totals land in every snapshot.
#[derive(Clone, Default)]
pub struct InMemoryMeterProvider {
    registry: Arc<Mutex<Registry>>,
}

impl InMemoryMeterProvider {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current samples: one counter per counter series, and `_count` and
    /// `_sum` per histogram series. Names map `.` to `_`.
    pub fn metrics(&self) -> Vec<Metric> {
        let registry = self.registry.lock();
        let mut metrics = Vec::new();
        for (name, family) in &registry.counters {
            let exposed = exposition_name(name);
            for (labels, value) in &family.series {
                let mut metric =
                    Metric::counter(exposed.clone(), family.help.clone(), as_f64(*value));
                metric.labels.clone_from(labels);
                metrics.push(metric);
            }
        }
        for (name, family) in &registry.histograms {
            let exposed = exposition_name(name);
            for (labels, state) in &family.series {
                let mut count = Metric::counter(
                    format!("{exposed}_count"),
                    family.help.clone(),
                    as_f64(state.count),
                );
                count.labels.clone_from(labels);
                let mut sum =
                    Metric::counter(format!("{exposed}_sum"), family.help.clone(), state.sum);
                sum.labels.clone_from(labels);
                metrics.push(count);
                metrics.push(sum);
            }
        }
        metrics
    }

    /// Render the registry with one HELP/TYPE header per family.
    pub fn render(&self) -> String {
        let registry = self.registry.lock();
        let mut out = String::new();
        for (name, family) in &registry.counters {
            let exposed = exposition_name(name);
            write_header(&mut out, &exposed, &family.help);
            for (labels, value) in &family.series {
                write_sample(&mut out, &exposed, labels, as_f64(*value));
            }
        }
        for (name, family) in &registry.histograms {
            let exposed = exposition_name(name);
            let columns: [(&str, fn(&HistogramState) -> f64); 2] =
                [("_count", HistogramState::count_f64), ("_sum", HistogramState::sum)];
            for (suffix, pick) in columns {
                let series_name = format!("{exposed}{suffix}");
                write_header(&mut out, &series_name, &family.help);
                for (labels, state) in &family.series {
                    write_sample(&mut out, &series_name, labels, pick(state));
                }
            }
        }
        out
    }

    fn register(&self, spec: &InstrumentSpec) -> Result<String> {
        validate_instrument_name(spec)?;
        let name = spec.name.as_str().to_string();
        let mut registry = self.registry.lock();
        match spec.kind {
            InstrumentKind::Counter => {
                registry
                    .counters
                    .entry(name.clone())
                    .or_insert_with(|| Family::new(spec));
            },
            InstrumentKind::Histogram => {
                registry
                    .histograms
                    .entry(name.clone())
                    .or_insert_with(|| Family::new(spec));
            },
        }
        Ok(name)
    }
}

fn series_key(attributes: &[Attribute]) -> SeriesKey {
    attributes
        .iter()
        .map(|attribute| (attribute.key.clone(), attribute.value.clone()))
        .collect()
}

fn exposition_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[allow(
    clippy::cast_precision_loss,
    reason = "exposition values are f64 by format"
)]
fn as_f64(value: u64) -> f64 {
    value as f64
}

fn write_header(out: &mut String, name: &str, help: &str) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {}", escape_help(help));
    let _ = writeln!(out, "# TYPE {name} counter");
}

fn write_sample(out: &mut String, name: &str, labels: &SeriesKey, value: f64) {
    out.push_str(name);
    if !labels.is_empty() {
        let rendered: Vec<String> = labels
            .iter()
            .map(|(key, value)| format!("{key}=\"{}\"", escape_label_value(value)))
            .collect();
        let _ = write!(out, "{{{}}}", rendered.join(","));
    }
    let _ = writeln!(out, " {}", format_sample_value(value));
}

struct RegistryCounter {
    name: String,
    registry: Arc<Mutex<Registry>>,
}

impl CounterInstrument for RegistryCounter {
    fn add(&self, value: u64, attributes: &[Attribute]) {
        let mut registry = self.registry.lock();
        if let Some(family) = registry.counters.get_mut(&self.name) {
            let total = family.series.entry(series_key(attributes)).or_default();
            *total = total.saturating_add(value);
        }
    }
}

struct RegistryHistogram {
    name: String,
    registry: Arc<Mutex<Registry>>,
}

impl HistogramInstrument for RegistryHistogram {
    fn record(&self, value: f64, attributes: &[Attribute]) {
        let mut registry = self.registry.lock();
        if let Some(family) = registry.histograms.get_mut(&self.name) {
            let state = family.series.entry(series_key(attributes)).or_default();
            state.count += 1;
            state.sum += value;
        }
    }
}

impl MeterProviderPort for InMemoryMeterProvider {
    fn provider_id(&self) -> &str {
        "in_memory"
    }

    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>> {
        let name = self.register(spec)?;
        Ok(Arc::new(RegistryCounter {
            name,
            registry: Arc::clone(&self.registry),
        }))
    }

    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>> {
        let name = self.register(spec)?;
        Ok(Arc::new(RegistryHistogram {
            name,
            registry: Arc::clone(&self.registry),
        }))
    }
}

impl Collector for InMemoryMeterProvider {
    fn name(&self) -> &str {
        "metrics"
    }

    fn collect(&self, _stage: &Stage) -> Result<Vec<Metric>> {
        Ok(self.metrics())
    }
}
