//! Instrument descriptors and recording outcomes.

use crate::primitives::InstrumentName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    /// Monotonic `u64` sum.
    Counter,
    /// `f64` distribution.
    Histogram,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Counter => "counter",
            Self::Histogram => "histogram",
        })
    }
}

/// Everything a provider needs to build one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Instrument name.
    pub name: InstrumentName,
    /// Counter or histogram.
    pub kind: InstrumentKind,
    /// UCUM-style unit (`ms`, `By`, or empty).
    pub unit: Box<str>,
    /// Human-readable description.
    pub description: Box<str>,
}

impl InstrumentSpec {
    /// Bare counter with no unit or description.
    #[must_use]
    pub fn counter(name: InstrumentName) -> Self {
        Self {
            name,
            kind: InstrumentKind::Counter,
            unit: "".into(),
            description: "".into(),
        }
    }

    /// Bare histogram with no unit or description.
    #[must_use]
    pub fn histogram(name: InstrumentName) -> Self {
        Self {
            name,
            kind: InstrumentKind::Histogram,
            unit: "".into(),
            description: "".into(),
        }
    }

    /// Set the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }
}

/// Success or failure of a timed operation, rendered as the `status` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Operation succeeded.
    Ok,
    /// Operation failed.
    Error,
}

impl Outcome {
    /// Derive the outcome from any result.
    pub const fn from_result<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(_) => Self::Error,
        }
    }

    /// Attribute value for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
