//! # scantel-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Telemetry composition root.
pub mod context;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger selection and subscriber setup.
pub mod observability;

pub use config_check::{load_effective_config, load_effective_config_json};
pub use context::TelemetryContext;
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use observability::{
    LOG_FORMAT_ENV, LOG_LEVEL_ENV, LogFormat, LoggingSettings, build_logger, init_tracing,
};

// Re-export redaction utilities for CLI boundary sanitization
pub use scantel_shared::{is_secret_key, redact_endpoint};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_adapters::adapters_crate_version;
    use scantel_app::app_crate_version;
    use scantel_config::config_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("scantel-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn infra_depends_on_app_adapters_config() {
        let deps = workspace_deps();
        for expected in ["scantel-app", "scantel-adapters", "scantel-config"] {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn infra_versions_match_workspace() {
        let version = infra_crate_version();
        assert_eq!(version, app_crate_version());
        assert_eq!(version, adapters_crate_version());
        assert_eq!(version, config_crate_version());
    }
}
