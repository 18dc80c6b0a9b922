//! Test fixtures for shared error codes and envelopes.

use scantel_shared::{ErrorCode, ErrorEnvelope};

/// Codes every telemetry entry point can surface.
pub fn telemetry_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::invalid_input(),
        ErrorCode::not_initialized(),
        ErrorCode::already_initialized(),
        ErrorCode::instrument_creation(),
        ErrorCode::collector_failed(),
        ErrorCode::parse(),
        ErrorCode::io(),
    ]
}

/// A malformed host counter fixture.
pub fn parse_error() -> ErrorEnvelope {
    ErrorEnvelope::parse("cpu line has 3 fields, need at least 6").with_metadata("fields", "3")
}

/// A backend rejection fixture.
pub fn instrument_creation_error(name: &str) -> ErrorEnvelope {
    ErrorEnvelope::instrument_creation(name, format!("backend rejected {name}"))
}

/// An unreadable source fixture.
pub fn io_error() -> ErrorEnvelope {
    std::io::Error::new(std::io::ErrorKind::NotFound, "/proc/stat missing").into()
}
