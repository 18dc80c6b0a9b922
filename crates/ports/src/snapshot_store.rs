//! Snapshot persistence boundary contract.

use scantel_shared::Result;
use std::path::{Path, PathBuf};

/// Durable storage for rendered snapshot files.
pub trait SnapshotStorePort: Send + Sync {
    /// Create `directory` and its parents if missing.
    fn ensure_directory(&self, directory: &Path) -> Result<()>;

    /// Replace `<directory>/<file_name>` with `contents` atomically.
    ///
    /// Readers observe either the previous file or the complete new one. On
    /// error the previous file is untouched. Returns the final path.
    fn publish(&self, directory: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf>;
}
