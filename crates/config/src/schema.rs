//! Telemetry configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML) with camelCase keys.
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and fills defaults for blank fields.

use scantel_shared::{ErrorCode, ErrorEnvelope, redact_endpoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default OTLP/HTTP collector endpoint.
pub const DEFAULT_METRICS_ENDPOINT: &str = "http://localhost:4318";
/// Default `service.name` resource attribute.
pub const DEFAULT_SERVICE_NAME: &str = "scantel";
/// Default periodic export interval.
pub const DEFAULT_COLLECTION_INTERVAL_MS: u64 = 10_000;
/// Default snapshot file prefix.
pub const DEFAULT_FILE_PREFIX: &str = "scantel";

const COLLECTION_INTERVAL_MIN_MS: u64 = 100;
const COLLECTION_INTERVAL_MAX_MS: u64 = 3_600_000;
const OTLP_METRICS_PATH: &str = "v1/metrics";

/// Top-level telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TelemetryConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Remote metering backend settings.
    pub metrics: MetricsConfig,
    /// On-disk resource exporter settings.
    pub exporter: ExporterConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            metrics: MetricsConfig::default(),
            exporter: ExporterConfig::default(),
        }
    }
}

/// Remote metering backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MetricsConfig {
    /// OTLP/HTTP collector endpoint.
    pub endpoint: String,
    /// `service.name` resource attribute.
    pub service_name: String,
    /// `service.version` resource attribute (omitted when empty).
    pub service_version: String,
    /// Explicit transport security override. `None` derives it from the
    /// endpoint scheme (`http://` means insecure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    /// Periodic export interval in milliseconds.
    pub collection_interval_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_METRICS_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: String::new(),
            insecure: None,
            collection_interval_ms: DEFAULT_COLLECTION_INTERVAL_MS,
        }
    }
}

/// On-disk resource exporter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExporterConfig {
    /// Snapshot directory. Required by the exporter, optional for the config.
    pub directory: String,
    /// Snapshot file and metric name prefix.
    pub file_prefix: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl ExporterConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        self.directory = self.directory.trim().to_string();
        let prefix = self.file_prefix.trim();
        self.file_prefix = if prefix.is_empty() {
            DEFAULT_FILE_PREFIX.to_string()
        } else {
            prefix.to_string()
        };
        if let Some(character) = self
            .file_prefix
            .chars()
            .find(|c| matches!(c, '/' | '\\') || c.is_whitespace())
        {
            return Err(ConfigSchemaError::InvalidFilePrefix {
                value: self.file_prefix.clone(),
                character,
            });
        }
        Ok(())
    }
}

impl TelemetryConfig {
    /// Validate and normalize the config, returning a validated wrapper.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedTelemetryConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        let metrics = self.metrics.normalize_and_validate()?;
        self.exporter.normalize_and_validate()?;
        Ok(ValidatedTelemetryConfig { raw: self, metrics })
    }
}

impl MetricsConfig {
    fn normalize_and_validate(&mut self) -> Result<ValidatedMetricsConfig, ConfigSchemaError> {
        let endpoint = self.endpoint.trim();
        self.endpoint = if endpoint.is_empty() {
            DEFAULT_METRICS_ENDPOINT.to_string()
        } else {
            endpoint.to_string()
        };
        let service_name = self.service_name.trim();
        self.service_name = if service_name.is_empty() {
            DEFAULT_SERVICE_NAME.to_string()
        } else {
            service_name.to_string()
        };
        self.service_version = self.service_version.trim().to_string();

        let url = Url::parse(&self.endpoint).map_err(|_| ConfigSchemaError::InvalidEndpoint {
            value: self.endpoint.clone(),
        })?;
        let insecure_by_scheme = match url.scheme() {
            "http" => true,
            "https" => false,
            other => {
                return Err(ConfigSchemaError::UnsupportedEndpointScheme {
                    scheme: other.to_string(),
                });
            },
        };

        if !(COLLECTION_INTERVAL_MIN_MS..=COLLECTION_INTERVAL_MAX_MS)
            .contains(&self.collection_interval_ms)
        {
            return Err(ConfigSchemaError::IntervalOutOfRange {
                value_ms: self.collection_interval_ms,
                min_ms: COLLECTION_INTERVAL_MIN_MS,
                max_ms: COLLECTION_INTERVAL_MAX_MS,
            });
        }

        Ok(ValidatedMetricsConfig {
            endpoint: url,
            service_name: self.service_name.clone(),
            service_version: self.service_version.clone(),
            insecure: self.insecure.unwrap_or(insecure_by_scheme),
            collection_interval: Duration::from_millis(self.collection_interval_ms),
        })
    }
}

/// Validated and normalized telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTelemetryConfig {
    raw: TelemetryConfig,
    metrics: ValidatedMetricsConfig,
}

impl ValidatedTelemetryConfig {
    /// Borrow the normalized raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &TelemetryConfig {
        &self.raw
    }

    /// Resolved metering backend settings.
    #[must_use]
    pub const fn metrics(&self) -> &ValidatedMetricsConfig {
        &self.metrics
    }

    /// Normalized exporter settings (directory may still be empty).
    #[must_use]
    pub const fn exporter(&self) -> &ExporterConfig {
        &self.raw.exporter
    }

    /// Consume and return the normalized raw config.
    #[must_use]
    pub fn into_inner(self) -> TelemetryConfig {
        self.raw
    }
}

/// Metering backend settings with every default and derivation applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMetricsConfig {
    /// Parsed endpoint.
    pub endpoint: Url,
    /// `service.name`.
    pub service_name: String,
    /// `service.version` (may be empty).
    pub service_version: String,
    /// Effective transport security flag.
    pub insecure: bool,
    /// Periodic export interval.
    pub collection_interval: Duration,
}

impl ValidatedMetricsConfig {
    /// Full OTLP/HTTP metrics URL: `/v1/metrics` is appended when the
    /// endpoint has no path of its own.
    #[must_use]
    pub fn otlp_metrics_url(&self) -> String {
        if self.endpoint.path() == "/" {
            format!("{}{OTLP_METRICS_PATH}", self.endpoint)
        } else {
            self.endpoint.to_string()
        }
    }
}

/// Parse a telemetry config from a JSON string, applying validation and normalization.
pub fn parse_telemetry_config_json(input: &str) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    let config: TelemetryConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a telemetry config from a TOML string, applying validation and normalization.
pub fn parse_telemetry_config_toml(input: &str) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    let config: TelemetryConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures for the telemetry config schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// Endpoint does not parse as a URL.
    InvalidEndpoint {
        /// Raw endpoint.
        value: String,
    },
    /// Endpoint scheme is neither `http` nor `https`.
    UnsupportedEndpointScheme {
        /// Scheme found.
        scheme: String,
    },
    /// Export interval outside the accepted range.
    IntervalOutOfRange {
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// File prefix contains a path separator or whitespace.
    InvalidFilePrefix {
        /// Normalized prefix.
        value: String,
        /// First offending character.
        character: char,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::InvalidEndpoint { .. } | Self::UnsupportedEndpointScheme { .. } => {
                ErrorCode::new("config", "invalid_endpoint")
            },
            Self::IntervalOutOfRange { .. } => ErrorCode::new("config", "interval_out_of_range"),
            Self::InvalidFilePrefix { .. } => ErrorCode::new("config", "invalid_prefix"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "config version {found} is not supported (expected {supported})"
            ),
            Self::InvalidEndpoint { .. } => {
                formatter.write_str("metrics.endpoint must be a valid URL")
            },
            Self::UnsupportedEndpointScheme { scheme } => write!(
                formatter,
                "metrics.endpoint scheme must be http or https, got {scheme}"
            ),
            Self::IntervalOutOfRange {
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "metrics.collectionIntervalMs must be within {min_ms}..={max_ms}, got {value_ms}"
            ),
            Self::InvalidFilePrefix { character, .. } => write!(
                formatter,
                "exporter.filePrefix contains unsupported character {character:?}"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::InvalidEndpoint { value } => {
                envelope.with_metadata("endpoint", redact_endpoint(&value))
            },
            ConfigSchemaError::UnsupportedEndpointScheme { scheme } => {
                envelope.with_metadata("scheme", scheme)
            },
            ConfigSchemaError::IntervalOutOfRange {
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::InvalidFilePrefix { value, character } => envelope
                .with_metadata("prefix", value)
                .with_metadata("character", character.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_implies_insecure() -> Result<(), ConfigSchemaError> {
        let validated = TelemetryConfig::default().validate_and_normalize()?;
        assert!(validated.metrics().insecure);
        assert_eq!(
            validated.metrics().collection_interval,
            Duration::from_secs(10)
        );
        Ok(())
    }

    #[test]
    fn explicit_insecure_override_wins() -> Result<(), ConfigSchemaError> {
        let mut config = TelemetryConfig::default();
        config.metrics.insecure = Some(false);
        assert!(!config.validate_and_normalize()?.metrics().insecure);

        let mut config = TelemetryConfig::default();
        config.metrics.endpoint = "https://collector.example:4318".to_string();
        assert!(!config.clone().validate_and_normalize()?.metrics().insecure);
        config.metrics.insecure = Some(true);
        assert!(config.validate_and_normalize()?.metrics().insecure);
        Ok(())
    }

    #[test]
    fn blank_fields_fall_back_to_defaults() -> Result<(), ConfigSchemaError> {
        let mut config = TelemetryConfig::default();
        config.metrics.endpoint = "   ".to_string();
        config.metrics.service_name = String::new();
        config.exporter.file_prefix = "  ".to_string();
        config.exporter.directory = "  /tmp/prom  ".to_string();

        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.as_ref().metrics.endpoint, DEFAULT_METRICS_ENDPOINT);
        assert_eq!(validated.metrics().service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(validated.exporter().file_prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(validated.exporter().directory, "/tmp/prom");
        Ok(())
    }

    #[test]
    fn otlp_url_appends_signal_path() -> Result<(), ConfigSchemaError> {
        let validated = TelemetryConfig::default().validate_and_normalize()?;
        assert_eq!(
            validated.metrics().otlp_metrics_url(),
            "http://localhost:4318/v1/metrics"
        );

        let mut config = TelemetryConfig::default();
        config.metrics.endpoint = "https://gw.example/custom/metrics".to_string();
        assert_eq!(
            config.validate_and_normalize()?.metrics().otlp_metrics_url(),
            "https://gw.example/custom/metrics"
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_scheme_interval_and_prefix() {
        let mut config = TelemetryConfig::default();
        config.metrics.endpoint = "ftp://collector".to_string();
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::UnsupportedEndpointScheme { .. })
        ));

        let mut config = TelemetryConfig::default();
        config.metrics.collection_interval_ms = 5;
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::IntervalOutOfRange { value_ms: 5, .. })
        ));

        let mut config = TelemetryConfig::default();
        config.exporter.file_prefix = "../escape".to_string();
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::InvalidFilePrefix { character: '/', .. })
        ));
    }

    #[test]
    fn invalid_endpoint_metadata_is_redacted() {
        let error = ConfigSchemaError::InvalidEndpoint {
            value: "::not a url::".to_string(),
        };
        let envelope: ErrorEnvelope = error.into();
        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_endpoint"));
        assert_eq!(
            envelope.metadata.get("endpoint").map(String::as_str),
            Some(scantel_shared::REDACTED)
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = parse_telemetry_config_json(r#"{"version":1,"metrics":{"endpont":"x"}}"#);
        assert!(matches!(
            result,
            Err(error) if error.code == ErrorCode::new("config", "invalid_json")
        ));
    }
}
