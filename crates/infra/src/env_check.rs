//! Environment validation helpers for CLI surfaces.

use scantel_config::{TelemetryConfig, TelemetryEnv, apply_env_overrides};
use scantel_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that `SCANTEL_*` overrides parse and merge into the default config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = TelemetryEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(TelemetryConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_shared::ErrorCode;

    #[test]
    fn empty_env_is_valid() -> InfraResult<()> {
        validate_env_parsing(&BTreeMap::new())
    }

    #[test]
    fn bad_endpoint_override_is_rejected() {
        let env = BTreeMap::from([(
            "SCANTEL_METRICS_ENDPOINT".to_string(),
            "not a url".to_string(),
        )]);
        let error = validate_env_parsing(&env).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "invalid_endpoint"))
        );
    }
}
