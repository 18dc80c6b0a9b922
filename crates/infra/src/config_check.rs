//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use scantel_config::{
    TelemetryEnv, ValidatedTelemetryConfig, load_telemetry_config_from_path, to_pretty_json,
};
use scantel_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from an env map and optional file.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<ValidatedTelemetryConfig> {
    let env = TelemetryEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_telemetry_config_from_path(config_path, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path)?;
    to_pretty_json(&config.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn env_overrides_file_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let env = BTreeMap::from([
            ("SCANTEL_SERVICE_NAME".to_string(), "planner".to_string()),
            ("SCANTEL_EXPORTER_DIR".to_string(), "/tmp/snaps".to_string()),
        ]);
        let json = load_effective_config_json(&env, None)?;
        assert!(json.ends_with('\n'));

        let value: Value = serde_json::from_str(&json)?;
        assert_eq!(value["metrics"]["serviceName"], "planner");
        assert_eq!(value["exporter"]["directory"], "/tmp/snaps");
        Ok(())
    }
}
