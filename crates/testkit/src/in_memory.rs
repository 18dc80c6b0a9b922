//! In-memory logger and snapshot store implementations.

use parking_lot::Mutex;
use scantel_ports::{LogEvent, LogFields, LoggerPort, SnapshotStorePort};
use scantel_shared::{ErrorEnvelope, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event. Children share the parent's buffer.
#[derive(Default)]
pub struct CapturingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl CapturingLogger {
    /// All captured events, oldest first.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Number of events named `event`.
    pub fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|captured| &*captured.event == event)
            .count()
    }

    /// Most recent event named `event`.
    pub fn last(&self, event: &str) -> Option<LogEvent> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|captured| &*captured.event == event)
            .cloned()
    }
}

impl LoggerPort for CapturingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        self.events.lock().push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

#[derive(Default)]
struct StoreState {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    publishes: usize,
    ensure_error: Option<ErrorEnvelope>,
    publish_error: Option<ErrorEnvelope>,
}

/// Snapshot store backed by a map; publishes are trivially atomic.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    state: Mutex<StoreState>,
}

impl InMemorySnapshotStore {
    /// Make `ensure_directory` fail with `error`.
    pub fn fail_ensure_directory(&self, error: impl Into<ErrorEnvelope>) {
        self.state.lock().ensure_error = Some(error.into());
    }

    /// Make every `publish` fail with `error`, or succeed again with `None`.
    pub fn fail_publishes(&self, error: Option<ErrorEnvelope>) {
        self.state.lock().publish_error = error;
    }

    /// UTF-8 contents of a published file.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.state
            .lock()
            .files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Successful publishes so far.
    pub fn publish_count(&self) -> usize {
        self.state.lock().publishes
    }

    /// Returns true when `ensure_directory` succeeded for `path`.
    pub fn has_directory(&self, path: &Path) -> bool {
        self.state.lock().directories.contains(path)
    }
}

impl SnapshotStorePort for InMemorySnapshotStore {
    fn ensure_directory(&self, directory: &Path) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(error) = state.ensure_error.clone() {
            return Err(error);
        }
        state.directories.insert(directory.to_path_buf());
        Ok(())
    }

    fn publish(&self, directory: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let mut state = self.state.lock();
        if let Some(error) = state.publish_error.clone() {
            return Err(error);
        }
        let path = directory.join(file_name);
        state.files.insert(path.clone(), contents.to_vec());
        state.publishes += 1;
        Ok(path)
    }
}
