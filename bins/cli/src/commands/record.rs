//! `record` command handler.

use super::{CommandEnv, error_output};
use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, log_info, ndjson_summary, pretty_json};
use clap::ValueEnum;
use scantel_adapters::log_sink::MemoryLogSink;
use scantel_adapters::metrics::JsonLinesMeterProvider;
use scantel_domain::{Attribute, parse_attribute_string};
use scantel_infra::TelemetryContext;
use scantel_shared::Result;
use serde_json::Value;
use std::sync::Arc;

/// Instrument flavor to record into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    /// Add integer deltas to a counter.
    Counter,
    /// Record floating-point values into a histogram.
    Histogram,
}

/// Provider that receives the measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// In-memory registry rendered as Prometheus text.
    Memory,
    /// One JSON line per measurement.
    Json,
    /// OTLP/HTTP export to the configured endpoint.
    #[cfg(feature = "otlp")]
    Otlp,
}

/// Flags for one record run.
#[derive(Debug)]
pub struct RecordInput<'a> {
    /// Counter or histogram.
    pub kind: RecordKind,
    /// Instrument name.
    pub name: &'a str,
    /// Raw values; each is recorded in order.
    pub values: &'a [String],
    /// Packed `k=v;k=v` attributes applied to every value.
    pub attrs: Option<&'a str>,
    /// Destination provider.
    pub backend: Backend,
    /// Config file, used by the OTLP backend.
    pub config: Option<&'a std::path::Path>,
}

#[derive(Debug, Clone, Copy)]
enum Measurement {
    Delta(i64),
    Value(f64),
}

enum Recorded {
    Exposition(String),
    Lines(Vec<String>),
    #[cfg(feature = "otlp")]
    Exported { endpoint: String },
}

/// Record every value through the metrics facade and print what the backend saw.
pub fn run_record(
    mode: OutputMode,
    env: &CommandEnv,
    input: &RecordInput<'_>,
) -> std::result::Result<CliOutput, CliError> {
    let measurements = parse_values(input.kind, input.values)?;
    let attributes = parse_attribute_string(input.attrs.unwrap_or_default());

    let recorded = match record(env, input, &measurements, &attributes) {
        Ok(recorded) => recorded,
        Err(error) => return Ok(error_output(mode, &error)),
    };

    let mut stderr = String::new();
    log_info(
        &mut stderr,
        &format!("recorded {} value(s) into {}", measurements.len(), input.name),
        mode.no_progress,
    );

    let kind = kind_label(input.kind);
    let stdout = match recorded {
        Recorded::Exposition(text) => {
            if mode.is_ndjson() {
                ndjson_summary(
                    "ok",
                    "record",
                    Some(serde_json::json!({
                        "name": input.name,
                        "instrument": kind,
                        "exposition": text,
                    })),
                )
            } else if mode.is_json() {
                pretty_json(&serde_json::json!({
                    "status": "ok",
                    "name": input.name,
                    "instrument": kind,
                    "count": measurements.len(),
                    "exposition": text,
                }))?
            } else {
                text
            }
        },
        Recorded::Lines(lines) => {
            if mode.is_ndjson() {
                let mut out = lines.concat();
                out.push_str(&ndjson_summary(
                    "ok",
                    "record",
                    Some(serde_json::json!({ "name": input.name, "count": lines.len() })),
                ));
                out
            } else if mode.is_json() {
                let parsed = lines
                    .iter()
                    .map(|line| serde_json::from_str::<Value>(line))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                pretty_json(&serde_json::json!({
                    "status": "ok",
                    "name": input.name,
                    "instrument": kind,
                    "lines": parsed,
                }))?
            } else {
                lines.concat()
            }
        },
        #[cfg(feature = "otlp")]
        Recorded::Exported { endpoint } => {
            if mode.is_ndjson() {
                ndjson_summary(
                    "ok",
                    "record",
                    Some(serde_json::json!({ "name": input.name, "endpoint": endpoint })),
                )
            } else if mode.is_json() {
                pretty_json(&serde_json::json!({
                    "status": "ok",
                    "name": input.name,
                    "instrument": kind,
                    "count": measurements.len(),
                    "endpoint": endpoint,
                }))?
            } else {
                format!("status: ok\nexported: {}\nendpoint: {endpoint}\n", measurements.len())
            }
        },
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn parse_values(
    kind: RecordKind,
    values: &[String],
) -> std::result::Result<Vec<Measurement>, CliError> {
    if values.is_empty() {
        return Err(CliError::InvalidInput("at least one --value is required".to_string()));
    }
    values
        .iter()
        .map(|raw| {
            let raw = raw.trim();
            match kind {
                RecordKind::Counter => raw.parse::<i64>().map(Measurement::Delta).map_err(|_| {
                    CliError::InvalidInput(format!("counter value must be an integer, got `{raw}`"))
                }),
                RecordKind::Histogram => raw.parse::<f64>().map(Measurement::Value).map_err(|_| {
                    CliError::InvalidInput(format!("histogram value must be a number, got `{raw}`"))
                }),
            }
        })
        .collect()
}

fn record(
    env: &CommandEnv,
    input: &RecordInput<'_>,
    measurements: &[Measurement],
    attributes: &[Attribute],
) -> Result<Recorded> {
    let context = TelemetryContext::new(Arc::clone(&env.logger));

    let finish: Box<dyn FnOnce() -> Recorded> = match input.backend {
        Backend::Memory => {
            let registry = context.install_in_memory();
            Box::new(move || Recorded::Exposition(registry.render()))
        },
        Backend::Json => {
            let sink = Arc::new(MemoryLogSink::default());
            context.install_provider(Arc::new(JsonLinesMeterProvider::new(sink.clone())));
            Box::new(move || Recorded::Lines(sink.take()))
        },
        #[cfg(feature = "otlp")]
        Backend::Otlp => {
            let config = scantel_infra::load_effective_config(&env.vars, input.config)?;
            context.connect_remote(config.metrics())?;
            let endpoint = scantel_infra::redact_endpoint(&config.metrics().otlp_metrics_url());
            Box::new(move || Recorded::Exported { endpoint })
        },
    };

    for measurement in measurements {
        match *measurement {
            Measurement::Delta(delta) => {
                context.facade().counter_add(input.name, delta, attributes)?;
            },
            Measurement::Value(value) => {
                context.facade().histogram_record(input.name, value, attributes)?;
            },
        }
    }

    // Flushes pending OTLP exports.
    context.shutdown()?;
    Ok(finish())
}

const fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Counter => "counter",
        RecordKind::Histogram => "histogram",
    }
}
