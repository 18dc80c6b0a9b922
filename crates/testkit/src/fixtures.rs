//! Access to files under `crates/testkit/fixtures`.

use std::path::{Path, PathBuf};
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    Missing {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(formatter, "missing fixture: {}", path.display()),
            Self::Read { path, source } => {
                write!(
                    formatter,
                    "failed to read fixture {}: {}",
                    path.display(),
                    source
                )
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Missing { .. } => None,
        }
    }
}

/// Root of the fixture tree.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Absolute path of `relative_path`, checked to exist.
pub fn fixture_path(relative_path: &str) -> Result<PathBuf, FixtureError> {
    let path = fixture_root().join(relative_path);
    if path.is_file() {
        Ok(path)
    } else {
        Err(FixtureError::Missing { path })
    }
}

/// Contents of `relative_path` as UTF-8.
pub fn read_fixture(relative_path: &str) -> Result<String, FixtureError> {
    let path = fixture_path(relative_path)?;
    fs::read_to_string(&path).map_err(|source| FixtureError::Read { path, source })
}

/// `/proc/stat` sample whose aggregate line is `cpu  10 0 20 500 30 ...`.
pub fn proc_stat_basic() -> Result<PathBuf, FixtureError> {
    fixture_path("proc/stat_basic")
}

/// `/proc/stat` sample whose aggregate line has too few fields.
pub fn proc_stat_short() -> Result<PathBuf, FixtureError> {
    fixture_path("proc/stat_short")
}
