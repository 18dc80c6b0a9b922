//! Environment variable parsing and merging.
//!
//! Every variable is optional. Present-but-blank values are rejected rather
//! than silently treated as unset.

use crate::schema::{TelemetryConfig, ValidatedTelemetryConfig};
use scantel_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_key, redact_endpoint};
use std::collections::BTreeMap;
use std::fmt;

const ENV_METRICS_ENDPOINT: &str = "SCANTEL_METRICS_ENDPOINT";
const ENV_SERVICE_NAME: &str = "SCANTEL_SERVICE_NAME";
const ENV_SERVICE_VERSION: &str = "SCANTEL_SERVICE_VERSION";
const ENV_METRICS_INSECURE: &str = "SCANTEL_METRICS_INSECURE";
const ENV_METRICS_INTERVAL_MS: &str = "SCANTEL_METRICS_INTERVAL_MS";
const ENV_EXPORTER_DIR: &str = "SCANTEL_EXPORTER_DIR";
const ENV_EXPORTER_PREFIX: &str = "SCANTEL_EXPORTER_PREFIX";

/// Prefix shared by every variable this crate reads.
pub const ENV_PREFIX: &str = "SCANTEL_";

/// Parsed env overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryEnv {
    /// `SCANTEL_METRICS_ENDPOINT`.
    pub metrics_endpoint: Option<String>,
    /// `SCANTEL_SERVICE_NAME`.
    pub service_name: Option<String>,
    /// `SCANTEL_SERVICE_VERSION`.
    pub service_version: Option<String>,
    /// `SCANTEL_METRICS_INSECURE`.
    pub metrics_insecure: Option<bool>,
    /// `SCANTEL_METRICS_INTERVAL_MS`.
    pub metrics_interval_ms: Option<u64>,
    /// `SCANTEL_EXPORTER_DIR`.
    pub exporter_dir: Option<String>,
    /// `SCANTEL_EXPORTER_PREFIX`.
    pub exporter_prefix: Option<String>,
}

impl TelemetryEnv {
    /// Parse overrides from an explicit map (tests, embedding hosts).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            metrics_endpoint: parse_optional_trimmed_string(map, ENV_METRICS_ENDPOINT)?,
            service_name: parse_optional_trimmed_string(map, ENV_SERVICE_NAME)?,
            service_version: parse_optional_trimmed_string(map, ENV_SERVICE_VERSION)?,
            metrics_insecure: parse_optional_bool(map, ENV_METRICS_INSECURE)?,
            metrics_interval_ms: parse_optional_u64(map, ENV_METRICS_INTERVAL_MS)?,
            exporter_dir: parse_optional_trimmed_string(map, ENV_EXPORTER_DIR)?,
            exporter_prefix: parse_optional_trimmed_string(map, ENV_EXPORTER_PREFIX)?,
        })
    }

    /// Parse overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self::from_map(&map)
    }
}

/// Apply env overrides to a config, then validate and normalize the result.
pub fn apply_env_overrides(
    mut config: TelemetryConfig,
    env: &TelemetryEnv,
) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    set_clone(&mut config.metrics.endpoint, env.metrics_endpoint.as_ref());
    set_clone(&mut config.metrics.service_name, env.service_name.as_ref());
    set_clone(
        &mut config.metrics.service_version,
        env.service_version.as_ref(),
    );
    if env.metrics_insecure.is_some() {
        config.metrics.insecure = env.metrics_insecure;
    }
    if let Some(interval) = env.metrics_interval_ms {
        config.metrics.collection_interval_ms = interval;
    }
    set_clone(&mut config.exporter.directory, env.exporter_dir.as_ref());
    set_clone(&mut config.exporter.file_prefix, env.exporter_prefix.as_ref());

    config.validate_and_normalize().map_err(ErrorEnvelope::from)
}

fn set_clone(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<String>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed.to_string()))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt { var, value: raw })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool { var, value: raw }),
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if var == ENV_METRICS_ENDPOINT {
        redact_endpoint(value)
    } else if is_secret_key(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
