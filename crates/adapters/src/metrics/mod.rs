//! Meter provider adapters.
//!
//! - [`InMemoryMeterProvider`]: pull registry rendered as text exposition.
//! - [`JsonLinesMeterProvider`]: one JSON line per sample over a `LogSink`.
//! - [`NoopMeterProvider`]: accepts everything, records nothing.
//! - `OtelMeterProvider` (feature `otlp`): periodic OTLP/HTTP push.

mod in_memory;
mod json_lines;
mod noop;
#[cfg(feature = "otlp")]
mod otlp;

pub use in_memory::InMemoryMeterProvider;
pub use json_lines::JsonLinesMeterProvider;
pub use noop::NoopMeterProvider;
#[cfg(feature = "otlp")]
pub use otlp::OtelMeterProvider;

use scantel_ports::InstrumentSpec;
use scantel_shared::{ErrorEnvelope, Result};

const MAX_INSTRUMENT_NAME_LEN: usize = 255;

/// Apply the OpenTelemetry instrument name rules.
///
/// Names start with an ASCII letter, continue with ASCII alphanumerics or
/// `_ . - /`, and are at most 255 characters long. Violations surface as
/// `telemetry:instrument_creation`.
pub fn validate_instrument_name(spec: &InstrumentSpec) -> Result<()> {
    let name = spec.name.as_str();
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter {
        return Err(ErrorEnvelope::instrument_creation(
            name,
            format!("instrument name {name:?} must start with an ASCII letter"),
        ));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || "_.-/".contains(*c))) {
        return Err(ErrorEnvelope::instrument_creation(
            name,
            format!("instrument name {name:?} contains unsupported character {bad:?}"),
        ));
    }
    if name.len() > MAX_INSTRUMENT_NAME_LEN {
        return Err(ErrorEnvelope::instrument_creation(
            name,
            format!("instrument name exceeds {MAX_INSTRUMENT_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scantel_domain::InstrumentName;
    use scantel_shared::ErrorCode;

    fn spec(name: &str) -> Result<InstrumentSpec> {
        Ok(InstrumentSpec::counter(InstrumentName::parse(name)?))
    }

    #[test]
    fn accepts_dotted_names() -> Result<()> {
        validate_instrument_name(&spec("scantel.object_store.bytes")?)?;
        validate_instrument_name(&spec("a/b-c_d.e1")?)?;
        Ok(())
    }

    #[test]
    fn rejects_bad_first_char_and_symbols() -> Result<()> {
        for name in ["1rows", "_rows", "rows total", "rows{x}"] {
            let error = validate_instrument_name(&spec(name)?).err();
            assert_eq!(
                error.map(|error| error.code),
                Some(ErrorCode::instrument_creation()),
                "{name}"
            );
        }
        Ok(())
    }

    #[test]
    fn rejects_overlong_names() -> Result<()> {
        let long = format!("a{}", "b".repeat(MAX_INSTRUMENT_NAME_LEN));
        assert!(validate_instrument_name(&spec(&long)?).is_err());
        Ok(())
    }

    proptest! {
        #[test]
        fn names_from_the_allowed_alphabet_pass(name in "[a-zA-Z][a-zA-Z0-9_./-]{0,40}") {
            let spec = spec(&name).map_err(|error| TestCaseError::fail(error.to_string()))?;
            prop_assert!(validate_instrument_name(&spec).is_ok());
        }
    }
}
