//! # scantel-shared
//!
//! Shared result types and error handling for the scantel workspace.
//!
//! - `ErrorEnvelope` / `ErrorCode` with the telemetry error namespaces
//! - `Result` alias
//! - secret redaction for log fields and endpoints
//!
//! This crate only depends on external crates.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, UnexpectedError,
    normalize_unexpected_error,
};
pub use redaction::{REDACTED, is_secret_key, redact_endpoint};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
