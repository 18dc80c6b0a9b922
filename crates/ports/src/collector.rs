//! Snapshot collector contracts.

use scantel_domain::{CpuTimes, Metric, Stage};
use scantel_shared::Result;

/// Pluggable producer of point-in-time samples, invoked on every snapshot.
pub trait Collector: Send + Sync {
    /// Name used in error metadata and logs. Must be non-empty.
    fn name(&self) -> &str;

    /// Produce the samples for this snapshot. Either every sample or an error.
    fn collect(&self, stage: &Stage) -> Result<Vec<Metric>>;
}

/// Host source of aggregate CPU counters.
pub trait CpuTimesPort: Send + Sync {
    /// Read the current totals. Unreadable source is an I/O error, malformed
    /// content is `telemetry:parse`.
    fn read_cpu_times(&self) -> Result<CpuTimes>;
}
