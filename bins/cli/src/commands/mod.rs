//! CLI command handlers.

pub mod attrs;
pub mod config;
pub mod info;
pub mod record;
pub mod snapshot;

pub use attrs::run_parse_attrs;
pub use config::{run_config_check, run_config_show};
pub use info::run_info;
pub use record::{Backend, RecordInput, RecordKind, run_record};
pub use snapshot::{SnapshotInput, run_snapshot};

use crate::CliOutput;
use crate::error::ExitCode;
use crate::format::{OutputMode, log_info, ndjson_line, pretty_json};
use scantel_infra::is_secret_key;
use scantel_ports::LoggerPort;
use scantel_shared::{ErrorEnvelope, REDACTED};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Process inputs shared by every handler.
pub struct CommandEnv {
    /// `SCANTEL_*` variables visible to the command.
    pub vars: BTreeMap<String, String>,
    /// Logger for telemetry lifecycle events.
    pub logger: Arc<dyn LoggerPort>,
}

/// Render a telemetry error in the requested format.
pub fn error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let payload = error_payload(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        let mut line = Map::new();
        line.insert("type".to_string(), Value::from("error"));
        line.insert("status".to_string(), Value::from("error"));
        line.insert("error".to_string(), payload);
        ndjson_line(&Value::Object(line)).unwrap_or_else(|_| fallback_error(false))
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({ "status": "error", "error": payload }))
            .unwrap_or_else(|_| fallback_error(true))
    } else {
        format_error_text(error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::for_envelope(error),
    }
}

fn error_payload(error: &ErrorEnvelope) -> Value {
    let metadata: Map<String, Value> = error
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(sanitize(key, value))))
        .collect();
    let mut payload = Map::new();
    payload.insert("code".to_string(), Value::from(error.code.to_string()));
    payload.insert("message".to_string(), Value::from(error.message.as_str()));
    payload.insert("kind".to_string(), Value::from(error.kind.to_string()));
    payload.insert(
        "retriable".to_string(),
        Value::from(error.class.is_retriable()),
    );
    if !metadata.is_empty() {
        payload.insert("metadata".to_string(), Value::Object(metadata));
    }
    Value::Object(payload)
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = format!("status: error\ncode: {}\nmessage: {}\n", error.code, error.message);
    for (key, value) in &error.metadata {
        out.push_str(&format!("{key}: {}\n", sanitize(key, value)));
    }
    out
}

fn sanitize<'a>(key: &str, value: &'a str) -> &'a str {
    if is_secret_key(key) { REDACTED } else { value }
}

fn fallback_error(pretty: bool) -> String {
    if pretty {
        "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}\n"
            .to_string()
    } else {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}\n"
            .to_string()
    }
}
