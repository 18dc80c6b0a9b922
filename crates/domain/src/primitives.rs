//! Validated telemetry primitives.

use scantel_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation failures for telemetry primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Instrument name is empty after trimming.
    EmptyInstrumentName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// Counter deltas must be monotonic.
    NegativeDelta {
        /// Rejected delta.
        delta: i64,
    },
    /// Stage contains a character outside `[A-Za-z0-9_-]`.
    InvalidStage {
        /// Trimmed stage that failed validation.
        input: String,
        /// First offending character.
        character: char,
    },
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInstrumentName { .. } => {
                formatter.write_str("instrument name must be non-empty")
            },
            Self::NegativeDelta { delta } => {
                write!(formatter, "counter delta must be >= 0, got {delta}")
            },
            Self::InvalidStage { input, character } => write!(
                formatter,
                "invalid stage {input:?}: unsupported character {character:?}"
            ),
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(ErrorCode::invalid_input(), error.to_string());
        match error {
            PrimitiveError::EmptyInstrumentName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::NegativeDelta { delta } => {
                envelope.with_metadata("delta", delta.to_string())
            },
            PrimitiveError::InvalidStage { input, character } => envelope
                .with_metadata("stage", input)
                .with_metadata("character", character.to_string()),
        }
    }
}

/// Trimmed, non-empty instrument name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentName(Box<str>);

impl InstrumentName {
    /// Validate a raw instrument name.
    pub fn parse(input: &str) -> Result<Self, PrimitiveError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptyInstrumentName {
                input_length: input.len(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Pipeline phase label attached to a resource snapshot.
///
/// The empty stage means "no stage": no `stage` label and no file suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Stage(Box<str>);

impl Stage {
    /// Trim and validate a raw stage.
    ///
    /// ```
    /// use scantel_domain::Stage;
    ///
    /// assert_eq!(Stage::parse("  start  ").map(|s| s.to_string()), Ok("start".to_string()));
    /// assert!(Stage::parse("bad stage").is_err());
    /// assert!(Stage::parse("").is_ok_and(|s| s.is_none()));
    /// ```
    pub fn parse(input: &str) -> Result<Self, PrimitiveError> {
        let trimmed = input.trim();
        if let Some(character) = trimmed.chars().find(|c| !is_stage_char(*c)) {
            return Err(PrimitiveError::InvalidStage {
                input: trimmed.to_string(),
                character,
            });
        }
        Ok(Self(trimmed.into()))
    }

    /// The "no stage" value.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true for the empty stage.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the stage text (possibly empty).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Snapshot file name for `prefix`: `<prefix>.prom` or `<prefix>_<stage>.prom`.
    #[must_use]
    pub fn file_name(&self, prefix: &str) -> String {
        if self.is_none() {
            format!("{prefix}.prom")
        } else {
            format!("{prefix}_{}.prom", self.0)
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

const fn is_stage_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
