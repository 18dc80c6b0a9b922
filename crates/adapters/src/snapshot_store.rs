//! Rename-based atomic snapshot persistence.

use scantel_ports::SnapshotStorePort;
use scantel_shared::{ErrorEnvelope, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File store that writes to a temp file in the target directory, fsyncs it,
/// and renames it over the final path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileSnapshotStore;

impl AtomicFileSnapshotStore {
    /// Create the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SnapshotStorePort for AtomicFileSnapshotStore {
    fn ensure_directory(&self, directory: &Path) -> Result<()> {
        fs::create_dir_all(directory)
            .map_err(|error| with_path(ErrorEnvelope::from(error), directory))
    }

    fn publish(&self, directory: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        publish_with(directory, file_name, |file| file.write_all(contents))
    }
}

fn publish_with<F>(directory: &Path, file_name: &str, fill: F) -> Result<PathBuf>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let target = directory.join(file_name);
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}.tmp-"))
        .tempfile_in(directory)
        .map_err(|error| with_path(ErrorEnvelope::from(error), directory))?;

    // The temp file is removed on drop if any step below fails.
    fill(temp.as_file_mut())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|error| with_path(ErrorEnvelope::from(error), temp.path()))?;

    temp.persist(&target)
        .map_err(|error| with_path(ErrorEnvelope::from(error.error), &target))?;
    sync_directory(directory)?;
    Ok(target)
}

fn with_path(error: ErrorEnvelope, path: &Path) -> ErrorEnvelope {
    error.with_metadata("path", path.display().to_string())
}

#[cfg(unix)]
fn sync_directory(directory: &Path) -> Result<()> {
    fs::File::open(directory)
        .and_then(|handle| handle.sync_all())
        .map_err(|error| with_path(ErrorEnvelope::from(error), directory))
}

#[cfg(not(unix))]
fn sync_directory(_directory: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_shared::ErrorCode;

    #[test]
    fn publish_replaces_target_and_leaves_no_temp() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = AtomicFileSnapshotStore::new();

        let first = store.publish(temp.path(), "scantel.prom", b"one\n")?;
        let second = store.publish(temp.path(), "scantel.prom", b"two\n")?;
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second)?, "two\n");

        let names: Vec<String> = fs::read_dir(temp.path())?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["scantel.prom".to_string()]);
        Ok(())
    }

    fn entry_names(directory: &Path) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(directory)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    #[test]
    fn interrupted_write_keeps_previous_snapshot() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = AtomicFileSnapshotStore::new();
        let previous = "# TYPE scantel_cpu_user_jiffies_total counter\n\
                        scantel_cpu_user_jiffies_total 10\n";
        let target = store.publish(temp.path(), "scantel.prom", previous.as_bytes())?;

        let error = publish_with(temp.path(), "scantel.prom", |file| {
            file.write_all(b"# TYPE scantel_cpu_user")?;
            Err(io::Error::other("disk full"))
        })
        .err();

        assert_eq!(error.as_ref().map(|error| &error.code), Some(&ErrorCode::io()));
        assert!(
            error
                .and_then(|error| error.metadata.get("path").cloned())
                .is_some_and(|path| path.contains(".scantel.prom.tmp-"))
        );
        assert_eq!(fs::read_to_string(&target)?, previous);
        assert_eq!(entry_names(temp.path())?, vec!["scantel.prom".to_string()]);
        Ok(())
    }

    #[test]
    fn publish_into_missing_directory_is_not_found() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("absent");
        let error = AtomicFileSnapshotStore::new()
            .publish(&missing, "scantel.prom", b"x")
            .err();
        assert_eq!(
            error.as_ref().map(|error| &error.code),
            Some(&ErrorCode::not_found())
        );
        assert!(error.is_some_and(|error| error.metadata.contains_key("path")));
        Ok(())
    }

    #[test]
    fn ensure_directory_is_idempotent() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let nested = temp.path().join("x").join("y");
        let store = AtomicFileSnapshotStore::new();
        store.ensure_directory(&nested)?;
        store.ensure_directory(&nested)?;
        assert!(nested.is_dir());
        Ok(())
    }
}
