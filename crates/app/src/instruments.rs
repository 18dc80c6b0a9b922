//! Fixed scan-pipeline instruments and their recording helpers.
//!
//! The set is built once per install. Helpers never fail: when the facade is
//! not ready, or an instrument could not be built, they do nothing.

use crate::facade::MetricsFacade;
use dashmap::DashMap;
use scantel_domain::{InstrumentKind, InstrumentName, InstrumentSpec, Outcome};
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, LoggerPort, MeterProviderPort, log_fields,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Catalog (metastore) RPC latency.
pub const CATALOG_REQUEST_DURATION: &str = "scantel.catalog.request.duration_ms";
/// Table metadata file fetch latency.
pub const METADATA_FETCH_DURATION: &str = "scantel.metadata.fetch.duration_ms";
/// Object-store request latency.
pub const OBJECT_STORE_REQUEST_DURATION: &str = "scantel.object_store.request.duration_ms";
/// Bytes read from the object store.
pub const OBJECT_STORE_BYTES: &str = "scantel.object_store.bytes";
/// Row filtering latency.
pub const FILTER_DURATION: &str = "scantel.scan.filter.duration_ms";
/// Bytes surviving row filtering.
pub const FILTERED_BYTES: &str = "scantel.scan.filtered.bytes";
/// Scan plan transfer latency.
pub const PLAN_TRANSFER_DURATION: &str = "scantel.scan.plan.transfer.duration_ms";
/// Bytes of scan plan transferred.
pub const PLAN_TRANSFER_BYTES: &str = "scantel.scan.plan.transfer.bytes";

const DOMAIN_INSTRUMENTS: [(&str, InstrumentKind, &str, &str); 8] = [
    (
        CATALOG_REQUEST_DURATION,
        InstrumentKind::Histogram,
        "ms",
        "Latency of catalog requests",
    ),
    (
        METADATA_FETCH_DURATION,
        InstrumentKind::Histogram,
        "ms",
        "Latency of table metadata fetches",
    ),
    (
        OBJECT_STORE_REQUEST_DURATION,
        InstrumentKind::Histogram,
        "ms",
        "Latency of object-store requests",
    ),
    (OBJECT_STORE_BYTES, InstrumentKind::Counter, "By", "Bytes read from the object store"),
    (FILTER_DURATION, InstrumentKind::Histogram, "ms", "Time spent filtering rows"),
    (FILTERED_BYTES, InstrumentKind::Counter, "By", "Bytes produced by row filtering"),
    (
        PLAN_TRANSFER_DURATION,
        InstrumentKind::Histogram,
        "ms",
        "Latency of scan plan transfers",
    ),
    (
        PLAN_TRANSFER_BYTES,
        InstrumentKind::Counter,
        "By",
        "Bytes of scan plan transferred",
    ),
];

/// Specs for the fixed instrument set, in creation order.
pub fn domain_instrument_specs() -> Vec<InstrumentSpec> {
    DOMAIN_INSTRUMENTS
        .iter()
        .filter_map(|(name, kind, unit, description)| {
            let name = InstrumentName::parse(name).ok()?;
            let spec = match kind {
                InstrumentKind::Histogram => InstrumentSpec::histogram(name),
                InstrumentKind::Counter => InstrumentSpec::counter(name),
            };
            Some(spec.with_unit(unit).with_description(description))
        })
        .collect()
}

#[derive(Default)]
pub(crate) struct DomainInstruments {
    catalog_request: Option<Arc<dyn HistogramInstrument>>,
    metadata_fetch: Option<Arc<dyn HistogramInstrument>>,
    object_store_request: Option<Arc<dyn HistogramInstrument>>,
    object_store_bytes: Option<Arc<dyn CounterInstrument>>,
    filter_duration: Option<Arc<dyn HistogramInstrument>>,
    filtered_bytes: Option<Arc<dyn CounterInstrument>>,
    plan_transfer_duration: Option<Arc<dyn HistogramInstrument>>,
    plan_transfer_bytes: Option<Arc<dyn CounterInstrument>>,
}

impl DomainInstruments {
    /// Build every fixed instrument against `provider` and seed the caches,
    /// so raw facade calls by the same name share the instrument.
    pub(crate) fn build(
        provider: &dyn MeterProviderPort,
        counters: &DashMap<Box<str>, Arc<dyn CounterInstrument>>,
        histograms: &DashMap<Box<str>, Arc<dyn HistogramInstrument>>,
        logger: Option<&dyn LoggerPort>,
    ) -> Self {
        let mut instruments = Self::default();
        for spec in domain_instrument_specs() {
            let name = spec.name.as_str();
            let built = match spec.kind {
                InstrumentKind::Histogram => provider.histogram(&spec).map(|histogram| {
                    histograms.insert(name.into(), Arc::clone(&histogram));
                    instruments.assign_histogram(name, histogram);
                }),
                InstrumentKind::Counter => provider.counter(&spec).map(|counter| {
                    counters.insert(name.into(), Arc::clone(&counter));
                    instruments.assign_counter(name, counter);
                }),
            };

            if let (Err(error), Some(logger)) = (built, logger) {
                logger.warn(
                    "metrics.domain_instrument_failed",
                    &format!("Domain instrument disabled: {error}"),
                    Some(log_fields([
                        ("instrument", Value::from(name)),
                        ("provider", Value::from(provider.provider_id())),
                    ])),
                );
            }
        }
        instruments
    }

    fn assign_histogram(&mut self, name: &str, histogram: Arc<dyn HistogramInstrument>) {
        let slot = match name {
            CATALOG_REQUEST_DURATION => &mut self.catalog_request,
            METADATA_FETCH_DURATION => &mut self.metadata_fetch,
            OBJECT_STORE_REQUEST_DURATION => &mut self.object_store_request,
            FILTER_DURATION => &mut self.filter_duration,
            PLAN_TRANSFER_DURATION => &mut self.plan_transfer_duration,
            _ => return,
        };
        *slot = Some(histogram);
    }

    fn assign_counter(&mut self, name: &str, counter: Arc<dyn CounterInstrument>) {
        let slot = match name {
            OBJECT_STORE_BYTES => &mut self.object_store_bytes,
            FILTERED_BYTES => &mut self.filtered_bytes,
            PLAN_TRANSFER_BYTES => &mut self.plan_transfer_bytes,
            _ => return,
        };
        *slot = Some(counter);
    }
}

fn helper_attributes(
    component: &str,
    operation: Option<(&str, &str)>,
    outcome: Outcome,
    extra: &[Attribute],
) -> Vec<Attribute> {
    let mut attributes = Vec::with_capacity(extra.len() + 3);
    attributes.push(Attribute::new("component", component));
    if let Some((key, value)) = operation {
        attributes.push(Attribute::new(key, value));
    }
    attributes.extend_from_slice(extra);
    attributes.push(Attribute::new("status", outcome.as_str()));
    attributes
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn record_duration(
    histogram: Option<&Arc<dyn HistogramInstrument>>,
    elapsed: Duration,
    attributes: &[Attribute],
) {
    if let Some(histogram) = histogram {
        histogram.record(millis(elapsed), attributes);
    }
}

fn add_bytes(counter: Option<&Arc<dyn CounterInstrument>>, bytes: i64, attributes: &[Attribute]) {
    let Ok(bytes) = u64::try_from(bytes) else {
        return;
    };
    if bytes == 0 {
        return;
    }
    if let Some(counter) = counter {
        counter.add(bytes, attributes);
    }
}

impl MetricsFacade {
    /// Record a catalog request (`component=catalog`, `operation`, `status`).
    pub fn record_catalog_request(
        &self,
        operation: &str,
        elapsed: Duration,
        outcome: Outcome,
        extra: &[Attribute],
    ) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes =
            helper_attributes("catalog", Some(("operation", operation)), outcome, extra);
        record_duration(
            generation.domain.catalog_request.as_ref(),
            elapsed,
            &attributes,
        );
    }

    /// Record a metadata fetch (`component=metadata`, `kind`, `status`).
    pub fn record_metadata_fetch(
        &self,
        kind: &str,
        elapsed: Duration,
        outcome: Outcome,
        extra: &[Attribute],
    ) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes("metadata", Some(("kind", kind)), outcome, extra);
        record_duration(
            generation.domain.metadata_fetch.as_ref(),
            elapsed,
            &attributes,
        );
    }

    /// Record an object-store request (`component=object_store`, `operation`, `status`).
    pub fn record_object_store_request(
        &self,
        operation: &str,
        elapsed: Duration,
        outcome: Outcome,
        extra: &[Attribute],
    ) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes(
            "object_store",
            Some(("operation", operation)),
            outcome,
            extra,
        );
        record_duration(
            generation.domain.object_store_request.as_ref(),
            elapsed,
            &attributes,
        );
    }

    /// Count bytes moved by an object-store request
    /// (`component=object_store`, `operation`, `status`). Skips `bytes <= 0`.
    pub fn add_object_store_bytes(
        &self,
        operation: &str,
        bytes: i64,
        outcome: Outcome,
        extra: &[Attribute],
    ) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes(
            "object_store",
            Some(("operation", operation)),
            outcome,
            extra,
        );
        add_bytes(
            generation.domain.object_store_bytes.as_ref(),
            bytes,
            &attributes,
        );
    }

    /// Record row filtering time (`component=scan`, `operation=filter`, `status`).
    pub fn record_filtering(&self, elapsed: Duration, outcome: Outcome, extra: &[Attribute]) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes("scan", Some(("operation", "filter")), outcome, extra);
        record_duration(
            generation.domain.filter_duration.as_ref(),
            elapsed,
            &attributes,
        );
    }

    /// Count bytes produced by filtering (`component=scan`, `operation=filter`,
    /// `status`). Skips `bytes <= 0`.
    pub fn add_filtered_bytes(&self, bytes: i64, outcome: Outcome, extra: &[Attribute]) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes("scan", Some(("operation", "filter")), outcome, extra);
        add_bytes(generation.domain.filtered_bytes.as_ref(), bytes, &attributes);
    }

    /// Record a scan plan transfer (`component=scan_plan`, `status`).
    pub fn record_plan_transfer(&self, elapsed: Duration, outcome: Outcome, extra: &[Attribute]) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes("scan_plan", None, outcome, extra);
        record_duration(
            generation.domain.plan_transfer_duration.as_ref(),
            elapsed,
            &attributes,
        );
    }

    /// Count scan plan bytes transferred (`component=scan_plan`, `status`).
    /// Skips `bytes <= 0`.
    pub fn add_plan_transfer_bytes(&self, bytes: i64, outcome: Outcome, extra: &[Attribute]) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let attributes = helper_attributes("scan_plan", None, outcome, extra);
        add_bytes(
            generation.domain.plan_transfer_bytes.as_ref(),
            bytes,
            &attributes,
        );
    }
}
