//! OTLP/HTTP push provider built on the OpenTelemetry SDK.

use super::validate_instrument_name;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider as _};
use opentelemetry_otlp::{MetricExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use scantel_config::ValidatedMetricsConfig;
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, InstrumentSpec, MeterProviderPort,
};
use scantel_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result, redact_endpoint};
use std::sync::Arc;

const METER_NAME: &str = "scantel";

/// Provider exporting through a periodic OTLP/HTTP reader.
pub struct OtelMeterProvider {
    provider: SdkMeterProvider,
    meter: Meter,
    endpoint: String,
}

impl OtelMeterProvider {
    /// Build the exporter, reader, and SDK provider from validated config.
    ///
    /// Nothing is sent until the first collection interval elapses.
    pub fn connect(config: &ValidatedMetricsConfig) -> Result<Self> {
        let endpoint = config.otlp_metrics_url();
        let exporter = MetricExporter::builder()
            .with_http()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    setup_code(),
                    format!("build OTLP metric exporter: {error}"),
                    ErrorClass::NonRetriable,
                )
                .with_metadata("endpoint", redact_endpoint(&endpoint))
            })?;

        let reader = PeriodicReader::builder(exporter)
            .with_interval(config.collection_interval)
            .build();

        let mut resource = Resource::builder().with_service_name(config.service_name.clone());
        if !config.service_version.is_empty() {
            resource = resource.with_attributes([KeyValue::new(
                "service.version",
                config.service_version.clone(),
            )]);
        }

        let provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource.build())
            .build();
        let meter = provider.meter(METER_NAME);

        Ok(Self {
            provider,
            meter,
            endpoint,
        })
    }

    /// Full OTLP metrics URL this provider pushes to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn setup_code() -> ErrorCode {
    ErrorCode::new("telemetry", "exporter_setup")
}

fn key_values(attributes: &[Attribute]) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|attribute| KeyValue::new(attribute.key.clone(), attribute.value.clone()))
        .collect()
}

struct OtelCounter(Counter<u64>);

impl CounterInstrument for OtelCounter {
    fn add(&self, value: u64, attributes: &[Attribute]) {
        self.0.add(value, &key_values(attributes));
    }
}

struct OtelHistogram(Histogram<f64>);

impl HistogramInstrument for OtelHistogram {
    fn record(&self, value: f64, attributes: &[Attribute]) {
        self.0.record(value, &key_values(attributes));
    }
}

impl MeterProviderPort for OtelMeterProvider {
    fn provider_id(&self) -> &str {
        "otlp"
    }

    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>> {
        validate_instrument_name(spec)?;
        let counter = self
            .meter
            .u64_counter(spec.name.as_str().to_string())
            .with_unit(spec.unit.to_string())
            .with_description(spec.description.to_string())
            .build();
        Ok(Arc::new(OtelCounter(counter)))
    }

    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>> {
        validate_instrument_name(spec)?;
        let histogram = self
            .meter
            .f64_histogram(spec.name.as_str().to_string())
            .with_unit(spec.unit.to_string())
            .with_description(spec.description.to_string())
            .build();
        Ok(Arc::new(OtelHistogram(histogram)))
    }

    fn shutdown(&self) -> Result<()> {
        self.provider.shutdown().map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("telemetry", "provider_shutdown"),
                format!("shut down OTLP meter provider: {error}"),
                ErrorClass::Retriable,
            )
            .with_metadata("endpoint", redact_endpoint(&self.endpoint))
        })
    }
}
