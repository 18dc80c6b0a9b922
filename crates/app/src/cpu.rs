//! Built-in aggregate CPU time collector.

use scantel_domain::{CpuTimes, Metric, Stage};
use scantel_ports::{Collector, CpuTimesPort};
use scantel_shared::Result;
use std::sync::Arc;

/// Name reported by [`CpuCollector`].
pub const CPU_COLLECTOR_NAME: &str = "cpu";

/// Renders host CPU totals as `<prefix>_cpu_{user,system,iowait}_jiffies_total`.
pub struct CpuCollector {
    prefix: String,
    source: Arc<dyn CpuTimesPort>,
}

impl CpuCollector {
    /// Collector emitting metric names under `prefix`.
    pub fn new(prefix: impl Into<String>, source: Arc<dyn CpuTimesPort>) -> Self {
        Self {
            prefix: prefix.into(),
            source,
        }
    }

    fn metrics(&self, times: CpuTimes) -> Vec<Metric> {
        let prefix = &self.prefix;
        vec![
            Metric::counter(
                format!("{prefix}_cpu_user_jiffies_total"),
                "Aggregate CPU time spent in user mode, in jiffies",
                jiffies(times.user),
            ),
            Metric::counter(
                format!("{prefix}_cpu_system_jiffies_total"),
                "Aggregate CPU time spent in kernel mode, in jiffies",
                jiffies(times.system),
            ),
            Metric::counter(
                format!("{prefix}_cpu_iowait_jiffies_total"),
                "Aggregate CPU time spent waiting for I/O, in jiffies",
                jiffies(times.iowait),
            ),
        ]
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "jiffy totals stay far below 2^53"
)]
fn jiffies(value: u64) -> f64 {
    value as f64
}

impl Collector for CpuCollector {
    fn name(&self) -> &str {
        CPU_COLLECTOR_NAME
    }

    fn collect(&self, _stage: &Stage) -> Result<Vec<Metric>> {
        let times = self.source.read_cpu_times()?;
        Ok(self.metrics(times))
    }
}
