//! # scantel-config
//!
//! Telemetry configuration schema, validation, env overrides, and file
//! loading. This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{EnvParseError, TelemetryEnv, apply_env_overrides};
pub use load::{
    load_telemetry_config_from_path, load_telemetry_config_from_sources,
    load_telemetry_config_std_env, to_pretty_json,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_COLLECTION_INTERVAL_MS,
    DEFAULT_FILE_PREFIX, DEFAULT_METRICS_ENDPOINT, DEFAULT_SERVICE_NAME, ExporterConfig,
    MetricsConfig, TelemetryConfig, ValidatedMetricsConfig, ValidatedTelemetryConfig,
    parse_telemetry_config_json, parse_telemetry_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
