//! Logger selection from `SCANTEL_LOG_FORMAT` and `SCANTEL_LOG_LEVEL`.

use scantel_adapters::log_sink::{LogSink, StderrLogSink};
use scantel_adapters::logger::{JsonLogger, TracingLogger};
use scantel_ports::{LogLevel, LoggerPort, log_fields};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Output format selector.
pub const LOG_FORMAT_ENV: &str = "SCANTEL_LOG_FORMAT";
/// Minimum level selector.
pub const LOG_LEVEL_ENV: &str = "SCANTEL_LOG_LEVEL";

/// How log events reach stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines through a `tracing-subscriber` fmt layer.
    #[default]
    Text,
    /// One JSON object per line from [`JsonLogger`].
    Json,
}

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Minimum level emitted.
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: LogLevel::Info,
        }
    }
}

impl LoggingSettings {
    /// Read settings from an explicit env map. Unknown values fall back to
    /// text output at `info`.
    pub fn from_env_map(env: &BTreeMap<String, String>) -> Self {
        let format = env
            .get(LOG_FORMAT_ENV)
            .filter(|value| value.trim().eq_ignore_ascii_case("json"))
            .map_or(LogFormat::Text, |_| LogFormat::Json);
        let level = env
            .get(LOG_LEVEL_ENV)
            .and_then(|value| LogLevel::parse(value))
            .unwrap_or(LogLevel::Info);
        Self { format, level }
    }

    /// Read settings from the process environment.
    pub fn from_std_env() -> Self {
        let env: BTreeMap<String, String> = [LOG_FORMAT_ENV, LOG_LEVEL_ENV]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::from_env_map(&env)
    }
}

/// Build the logger for `settings`, writing JSON to stderr or forwarding to
/// `tracing`.
pub fn build_logger(settings: &LoggingSettings) -> Arc<dyn LoggerPort> {
    match settings.format {
        LogFormat::Json => {
            let sink: Arc<dyn LogSink> = Arc::new(StderrLogSink);
            Arc::new(
                JsonLogger::new(sink)
                    .with_min_level(settings.level)
                    .with_base_fields(log_fields([("service", Value::from("scantel"))])),
            )
        },
        LogFormat::Text => Arc::new(TracingLogger::new()),
    }
}

/// Install a stderr fmt subscriber filtered at `settings.level`.
///
/// Does nothing for JSON output. Returns false when another subscriber was
/// already installed.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    if settings.format == LogFormat::Json {
        return false;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(settings.level.as_str()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
