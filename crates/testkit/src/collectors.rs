//! Collector and host-source doubles for exporter tests.

use parking_lot::Mutex;
use scantel_ports::{Collector, CpuTimes, CpuTimesPort, Metric, Stage};
use scantel_shared::{ErrorEnvelope, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collector returning a fixed sample set.
pub struct StubCollector {
    name: String,
    metrics: Vec<Metric>,
    calls: AtomicUsize,
    stages: Mutex<Vec<String>>,
}

impl StubCollector {
    /// Collector named `name` that always returns `metrics`.
    pub fn new(name: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            name: name.into(),
            metrics,
            calls: AtomicUsize::new(0),
            stages: Mutex::new(Vec::new()),
        }
    }

    /// Number of `collect` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stages passed to `collect`, in call order.
    pub fn stages(&self) -> Vec<String> {
        self.stages.lock().clone()
    }
}

impl Collector for StubCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect(&self, stage: &Stage) -> Result<Vec<Metric>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.stages.lock().push(stage.as_str().to_string());
        Ok(self.metrics.clone())
    }
}

/// Collector that always fails with the same error.
pub struct FailingCollector {
    name: String,
    error: ErrorEnvelope,
}

impl FailingCollector {
    /// Collector named `name` failing with `error`.
    pub fn new(name: impl Into<String>, error: ErrorEnvelope) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl Collector for FailingCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect(&self, _stage: &Stage) -> Result<Vec<Metric>> {
        Err(self.error.clone())
    }
}

/// CPU source with settable totals.
pub struct FixedCpuSource {
    result: Mutex<Result<CpuTimes>>,
}

impl FixedCpuSource {
    /// Source returning `times`.
    pub fn new(times: CpuTimes) -> Self {
        Self {
            result: Mutex::new(Ok(times)),
        }
    }

    /// Source failing with `error`.
    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            result: Mutex::new(Err(error)),
        }
    }

    /// Replace the totals returned from now on.
    pub fn set(&self, times: CpuTimes) {
        *self.result.lock() = Ok(times);
    }
}

impl CpuTimesPort for FixedCpuSource {
    fn read_cpu_times(&self) -> Result<CpuTimes> {
        self.result.lock().clone()
    }
}
