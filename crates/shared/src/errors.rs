//! Error envelope types and the telemetry error taxonomy.
//!
//! Every fallible operation in the workspace returns an [`ErrorEnvelope`].
//! The `code` carries the stable identity of the failure (`namespace:code`);
//! `kind` and `class` describe where it came from and whether a retry can help.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (validation, caller misuse, lifecycle ordering).
    Expected,
    /// Invariant violations inside the telemetry core.
    Invariant,
    /// Unexpected failures (I/O, metering backend).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        })
    }
}

/// Retry classification for failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The operation can be retried safely.
    Retriable,
    /// The operation should not be retried.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true when the error is considered retriable.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Retriable => "retriable",
            Self::NonRetriable => "non-retriable",
        })
    }
}

/// Stable error code with namespace and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Invalid argument supplied by the caller.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Not found code.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Permission denied code.
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// I/O error code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// No provider / exporter is installed.
    pub fn not_initialized() -> Self {
        Self::new("telemetry", "not_initialized")
    }

    /// The exporter slot (or remote setup) was already used.
    pub fn already_initialized() -> Self {
        Self::new("telemetry", "already_initialized")
    }

    /// The metering backend refused to build an instrument.
    pub fn instrument_creation() -> Self {
        Self::new("telemetry", "instrument_creation")
    }

    /// A snapshot collector failed.
    pub fn collector_failed() -> Self {
        Self::new("telemetry", "collector_failed")
    }

    /// A host counter source was malformed.
    pub fn parse() -> Self {
        Self::new("telemetry", "parse")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns true when the code belongs to the I/O family produced by
    /// [`ErrorEnvelope::from`] on an `io::Error`.
    #[must_use]
    pub fn is_io_family(&self) -> bool {
        self.namespace == "core"
            && matches!(
                self.code.as_str(),
                "io" | "not_found" | "permission_denied" | "timeout"
            )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    fn build(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: String) -> Self {
        Self {
            kind,
            class,
            code,
            message,
            metadata: BTreeMap::new(),
        }
    }

    /// Create an expected error with non-retriable classification.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Expected,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Create an invariant error (always non-retriable).
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Invariant,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Create an unexpected error with the provided retry classification.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::build(ErrorKind::Unexpected, class, code, message.into())
    }

    /// Caller passed a bad name, delta, stage, or collector.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::invalid_input(), message)
    }

    /// Operation requires an installed provider or exporter.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::not_initialized(), message)
    }

    /// Exporter slot or remote setup gate already used.
    pub fn already_initialized(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::already_initialized(), message)
    }

    /// Backend rejected an instrument.
    pub fn instrument_creation(name: &str, message: impl Into<String>) -> Self {
        Self::unexpected(
            ErrorCode::instrument_creation(),
            message,
            ErrorClass::NonRetriable,
        )
        .with_metadata("instrument", name)
    }

    /// Host counter source was malformed.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::unexpected(ErrorCode::parse(), message, ErrorClass::NonRetriable)
    }

    /// Wrap a collector failure with the collector's name and the cause code.
    #[must_use]
    pub fn collector_failed(collector: &str, cause: Self) -> Self {
        let mut wrapped = Self::build(
            ErrorKind::Unexpected,
            cause.class,
            ErrorCode::collector_failed(),
            format!("collect {collector} metrics: {}", cause.message),
        );
        wrapped.metadata = cause.metadata;
        wrapped
            .with_metadata("collector", collector)
            .with_metadata("causeCode", cause.code.to_string())
    }

    /// Returns true when the envelope carries `code`.
    #[must_use]
    pub fn has_code(&self, code: &ErrorCode) -> bool {
        &self.code == code
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        normalize_unexpected_error(UnexpectedError::error(error))
    }
}

/// Normalize unexpected errors into a structured envelope.
pub fn normalize_unexpected_error(error: UnexpectedError) -> ErrorEnvelope {
    match error {
        UnexpectedError::Message(message) => {
            ErrorEnvelope::unexpected(ErrorCode::internal(), message, ErrorClass::NonRetriable)
        },
        UnexpectedError::Error(error) => {
            let (code, class) = classify_error(&*error);
            ErrorEnvelope::unexpected(code, error.to_string(), class)
        },
    }
}

/// Normalized wrapper for unexpected errors and messages.
#[derive(Debug)]
pub enum UnexpectedError {
    /// Unexpected error message.
    Message(String),
    /// Unexpected error payload.
    Error(Box<dyn std::error::Error + Send + Sync>),
}

impl UnexpectedError {
    /// Wrap an unexpected message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an unexpected error value.
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Error(Box::new(error))
    }
}

fn classify_error(error: &(dyn std::error::Error + 'static)) -> (ErrorCode, ErrorClass) {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(candidate) = current {
        if let Some(io_error) = candidate.downcast_ref::<io::Error>() {
            let kind = io_error.kind();
            let class = if is_retriable_io(kind) {
                ErrorClass::Retriable
            } else {
                ErrorClass::NonRetriable
            };
            return (error_code_from_io_kind(kind), class);
        }
        current = candidate.source();
    }

    (ErrorCode::internal(), ErrorClass::NonRetriable)
}

fn error_code_from_io_kind(kind: io::ErrorKind) -> ErrorCode {
    match kind {
        io::ErrorKind::NotFound => ErrorCode::not_found(),
        io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
        io::ErrorKind::TimedOut => ErrorCode::new("core", "timeout"),
        _ => ErrorCode::io(),
    }
}

const fn is_retriable_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
