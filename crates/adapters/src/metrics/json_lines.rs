use super::validate_instrument_name;
use crate::log_sink::LogSink;
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, InstrumentSpec, MeterProviderPort,
};
use scantel_shared::{REDACTED, Result, is_secret_key};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const SERIALIZE_FAILED_LINE: &str =
    "{\"type\":\"metric\",\"metricType\":\"error\",\"name\":\"metrics.serialize_failed\",\"value\":1}\n";

/// Provider that writes one JSON line per sample.
///
/// Line shape: `type`, `timestampMs`, `metricType`, `name`, `value`, optional
/// `unit`, and `attributes` when any are present. Secret-looking attribute
/// keys are redacted.
#[derive(Clone)]
pub struct JsonLinesMeterProvider {
    sink: Arc<dyn LogSink>,
}

impl JsonLinesMeterProvider {
    /// Provider writing to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

struct LineInstrument {
    sink: Arc<dyn LogSink>,
    name: Box<str>,
    unit: Box<str>,
}

impl LineInstrument {
    fn new(sink: &Arc<dyn LogSink>, spec: &InstrumentSpec) -> Self {
        Self {
            sink: Arc::clone(sink),
            name: spec.name.as_str().into(),
            unit: spec.unit.clone(),
        }
    }

    fn emit(&self, metric_type: &str, value: Value, attributes: &[Attribute]) {
        let mut payload = Map::new();
        payload.insert("type".to_string(), Value::from("metric"));
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert("metricType".to_string(), Value::from(metric_type));
        payload.insert("name".to_string(), Value::from(&*self.name));
        payload.insert("value".to_string(), value);
        if !self.unit.is_empty() {
            payload.insert("unit".to_string(), Value::from(&*self.unit));
        }
        if !attributes.is_empty() {
            payload.insert("attributes".to_string(), attributes_to_json(attributes));
        }
        self.sink.write_line(&to_line(payload));
    }
}

impl CounterInstrument for LineInstrument {
    fn add(&self, value: u64, attributes: &[Attribute]) {
        self.emit("counter", Value::from(value), attributes);
    }
}

impl HistogramInstrument for LineInstrument {
    fn record(&self, value: f64, attributes: &[Attribute]) {
        // Non-finite values have no JSON number form.
        let value = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.emit("histogram", value, attributes);
    }
}

impl MeterProviderPort for JsonLinesMeterProvider {
    fn provider_id(&self) -> &str {
        "json_lines"
    }

    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>> {
        validate_instrument_name(spec)?;
        Ok(Arc::new(LineInstrument::new(&self.sink, spec)))
    }

    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>> {
        validate_instrument_name(spec)?;
        Ok(Arc::new(LineInstrument::new(&self.sink, spec)))
    }
}

fn attributes_to_json(attributes: &[Attribute]) -> Value {
    let mut map = Map::new();
    for attribute in attributes {
        let value = if is_secret_key(&attribute.key) {
            REDACTED
        } else {
            attribute.value.as_str()
        };
        map.insert(attribute.key.clone(), Value::from(value));
    }
    Value::Object(map)
}

fn to_line(payload: Map<String, Value>) -> String {
    serde_json::to_string(&Value::Object(payload)).map_or_else(
        |_| SERIALIZE_FAILED_LINE.to_string(),
        |mut encoded| {
            encoded.push('\n');
            encoded
        },
    )
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
