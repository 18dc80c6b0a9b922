//! Host counter sources.

use scantel_ports::{CpuTimes, CpuTimesPort};
use scantel_shared::{ErrorEnvelope, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SYSTEM_PROC_STAT: &str = "/proc/stat";
const USER_FIELD: usize = 1;
const SYSTEM_FIELD: usize = 3;
const IOWAIT_FIELD: usize = 5;
const MIN_TOKENS: usize = IOWAIT_FIELD + 1;

/// Failures reading or parsing a `/proc/stat` style file.
#[derive(Debug, Error)]
pub enum ProcStatError {
    /// The source file could not be read.
    #[error("read {path}: {source}", path = path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No line starts with the `cpu` token.
    #[error("no aggregate `cpu ` line")]
    MissingCpuLine,
    /// The aggregate line stops before the iowait field.
    #[error("aggregate cpu line has {found} fields, need at least {MIN_TOKENS}")]
    TooFewFields {
        /// Tokens present, including the `cpu` label.
        found: usize,
    },
    /// A required field is not a `u64`.
    #[error("cpu field {index} is not an unsigned integer: {value:?}")]
    InvalidField {
        /// Token index within the line.
        index: usize,
        /// Raw token.
        value: String,
    },
}

impl From<ProcStatError> for ErrorEnvelope {
    fn from(error: ProcStatError) -> Self {
        let message = error.to_string();
        match error {
            ProcStatError::Read { path, source } => {
                Self::from(source).with_metadata("path", path.display().to_string())
            },
            ProcStatError::MissingCpuLine => Self::parse(message),
            ProcStatError::TooFewFields { found } => {
                Self::parse(message).with_metadata("fields", found.to_string())
            },
            ProcStatError::InvalidField { index, .. } => {
                Self::parse(message).with_metadata("field", index.to_string())
            },
        }
    }
}

/// Extract user, system, and iowait jiffies from `/proc/stat` contents.
///
/// Only the aggregate line (first token exactly `cpu`) is read. Per-core
/// lines are ignored.
pub fn parse_proc_stat(contents: &str) -> std::result::Result<CpuTimes, ProcStatError> {
    let tokens: Vec<&str> = contents
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|tokens| tokens.first() == Some(&"cpu"))
        .ok_or(ProcStatError::MissingCpuLine)?;

    if tokens.len() < MIN_TOKENS {
        return Err(ProcStatError::TooFewFields {
            found: tokens.len(),
        });
    }

    let field = |index: usize| {
        let raw = tokens.get(index).copied().unwrap_or_default();
        raw.parse::<u64>().map_err(|_| ProcStatError::InvalidField {
            index,
            value: raw.to_string(),
        })
    };

    Ok(CpuTimes {
        user: field(USER_FIELD)?,
        system: field(SYSTEM_FIELD)?,
        iowait: field(IOWAIT_FIELD)?,
    })
}

/// Reads CPU totals from a `/proc/stat` formatted file on every call.
#[derive(Debug, Clone)]
pub struct ProcStatReader {
    path: PathBuf,
}

impl ProcStatReader {
    /// Reader over an arbitrary path (fixtures, containers with remapped proc).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reader over the host's `/proc/stat`.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SYSTEM_PROC_STAT)
    }

    /// Source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> std::result::Result<CpuTimes, ProcStatError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|source| ProcStatError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_proc_stat(&contents)
    }
}

impl CpuTimesPort for ProcStatReader {
    fn read_cpu_times(&self) -> Result<CpuTimes> {
        Ok(self.read()?)
    }
}
