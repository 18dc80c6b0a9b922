//! `config check` and `config show` handlers.

use super::{CommandEnv, error_output};
use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, log_info, ndjson_summary, pretty_json};
use scantel_infra::{load_effective_config_json, redact_endpoint};
use serde_json::Value;
use std::path::Path;

/// Validate the effective config (file + `SCANTEL_*` overrides).
pub fn run_config_check(
    mode: OutputMode,
    env: &CommandEnv,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let loaded = match load_effective_config_json(&env.vars, path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(error_output(mode, &error)),
    };
    let config = redacted_config(&loaded)?;
    let summary = Summary::from_config(&config);

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        ndjson_summary("ok", "config", Some(serde_json::json!({ "configPath": display(path) })))
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": display(path),
            "effectiveConfig": config,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig: ok\n");
        if let Some(path) = path {
            out.push_str(&format!("path: {}\n", path.display()));
        }
        out.push_str(&format!(
            "endpoint: {}\nexporter: {}\n",
            summary.endpoint, summary.exporter
        ));
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Print the effective config as pretty JSON.
pub fn run_config_show(
    mode: OutputMode,
    env: &CommandEnv,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let loaded = match load_effective_config_json(&env.vars, path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(error_output(mode, &error)),
    };
    let config = redacted_config(&loaded)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        ndjson_summary(
            "ok",
            "config",
            Some(serde_json::json!({ "effectiveConfig": config })),
        )
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": display(path),
            "effectiveConfig": config,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig:\n");
        out.push_str(&pretty_json(&config)?);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

struct Summary {
    endpoint: String,
    exporter: String,
}

impl Summary {
    fn from_config(config: &Value) -> Self {
        let text = |pointer: &str| {
            config
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let directory = text("/exporter/directory");
        Self {
            endpoint: text("/metrics/endpoint"),
            exporter: if directory.is_empty() {
                "disabled".to_string()
            } else {
                format!("{directory} ({})", text("/exporter/filePrefix"))
            },
        }
    }
}

/// Parse the effective config JSON and redact the metrics endpoint.
fn redacted_config(loaded: &str) -> Result<Value, serde_json::Error> {
    let mut config: Value = serde_json::from_str(loaded)?;
    if let Some(endpoint) = config.pointer_mut("/metrics/endpoint") {
        let redacted = endpoint.as_str().map(redact_endpoint);
        if let Some(redacted) = redacted {
            *endpoint = Value::from(redacted);
        }
    }
    Ok(config)
}

fn display(path: Option<&Path>) -> Option<String> {
    path.map(|path| path.to_string_lossy().into_owned())
}
