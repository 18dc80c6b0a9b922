//! Point-in-time metric samples produced by snapshot collectors.

use crate::attributes::Attribute;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rendered label set, ordered by key.
pub type Labels = BTreeMap<String, String>;

/// Exposition type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonic total.
    Counter,
    /// Instantaneous value.
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        })
    }
}

/// One sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name.
    pub name: String,
    /// HELP text.
    pub help: String,
    /// TYPE.
    pub kind: MetricKind,
    /// Sample value.
    pub value: f64,
    /// Labels (the exporter adds `stage`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
}

impl Metric {
    /// Counter sample without labels.
    pub fn counter(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind: MetricKind::Counter,
            value,
            labels: Labels::new(),
        }
    }

    /// Gauge sample without labels.
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        Self {
            kind: MetricKind::Gauge,
            ..Self::counter(name, help, value)
        }
    }

    /// Add or replace one label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add labels from attributes; later duplicates win.
    #[must_use]
    pub fn with_attributes(mut self, attributes: &[Attribute]) -> Self {
        for attribute in attributes {
            self.labels
                .insert(attribute.key.clone(), attribute.value.clone());
        }
        self
    }
}

/// Aggregate CPU time counters in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    /// Time spent in user mode.
    pub user: u64,
    /// Time spent in kernel mode.
    pub system: u64,
    /// Time spent waiting for I/O.
    pub iowait: u64,
}
