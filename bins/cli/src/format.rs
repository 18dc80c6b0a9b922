//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};
use serde_json::{Map, Value};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
    /// Line-delimited JSON (NDJSON) output.
    Ndjson,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Suppress `info:` progress lines on stderr.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output.unwrap_or(OutputFormat::Text),
            no_progress: args.no_progress,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Returns true when NDJSON output is requested.
    #[must_use]
    pub const fn is_ndjson(self) -> bool {
        matches!(self.format, OutputFormat::Ndjson)
    }
}

/// Pretty JSON with a trailing newline.
pub fn pretty_json(payload: &Value) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string_pretty(payload)?;
    output.push('\n');
    Ok(output)
}

/// One NDJSON line of `payload`.
pub fn ndjson_line(payload: &Value) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string(payload)?;
    output.push('\n');
    Ok(output)
}

/// NDJSON summary line: `{"type":"summary","status":..,"kind":..,...extra}`.
pub fn ndjson_summary(status: &str, kind: &str, extra: Option<Value>) -> String {
    let mut payload = Map::new();
    payload.insert("type".to_string(), Value::from("summary"));
    payload.insert("status".to_string(), Value::from(status));
    payload.insert("kind".to_string(), Value::from(kind));
    if let Some(Value::Object(map)) = extra {
        payload.extend(map);
    }
    ndjson_line(&Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"kind\":\"internal\"}\n".to_string()
    })
}

/// Append an `info:` progress line unless suppressed.
pub fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_merges_extra_fields() -> Result<(), serde_json::Error> {
        let line = ndjson_summary("ok", "snapshot", Some(serde_json::json!({ "path": "/x" })));
        let value: Value = serde_json::from_str(line.trim())?;
        assert_eq!(value["type"], "summary");
        assert_eq!(value["kind"], "snapshot");
        assert_eq!(value["path"], "/x");
        Ok(())
    }

    #[test]
    fn log_info_respects_no_progress() {
        let mut stderr = String::new();
        log_info(&mut stderr, "message", true);
        assert!(stderr.is_empty());
        log_info(&mut stderr, "message", false);
        assert_eq!(stderr, "info: message\n");
    }
}
