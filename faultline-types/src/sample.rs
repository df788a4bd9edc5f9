//! Behavior samples — timestamped observations produced by the monitor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one HTTP health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the probe returned a 2xx status in time.
    pub success: bool,
    /// HTTP status code (0 if the request never completed).
    pub status: u16,
    /// Round-trip latency in milliseconds.
    pub latency_ms: f64,
}

impl ProbeResult {
    /// A probe that never completed (connect error or timeout).
    pub fn failed(latency_ms: f64) -> Self {
        Self {
            success: false,
            status: 0,
            latency_ms,
        }
    }
}

/// Resource usage of one component at sampling time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceStats {
    /// CPU usage percentage.
    pub cpu_percent: f64,
    /// Memory usage in bytes.
    pub memory_bytes: u64,
    /// Configured memory limit in bytes (0 = unlimited).
    pub memory_limit_bytes: u64,
}

/// One directed reachability observation between two workload instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEntry {
    /// Probing instance.
    pub from: String,
    /// Probed instance.
    pub to: String,
    /// Whether `to` was reachable from `from`.
    pub reachable: bool,
}

/// One timestamped observation of system behavior.
///
/// Samples form an append-only ordered sequence; the monitor produces one
/// per tick and timestamps are monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSample {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Health probe result per component name.
    pub probes: BTreeMap<String, ProbeResult>,
    /// Resource stats per component name.
    pub resources: BTreeMap<String, ResourceStats>,
    /// Pairwise workload connectivity matrix entries.
    pub connectivity: Vec<ConnectivityEntry>,
    /// True if part of this tick's collection failed and the sample is partial.
    pub degraded: bool,
}

impl BehaviorSample {
    /// An empty sample recorded when an entire tick failed.
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            probes: BTreeMap::new(),
            resources: BTreeMap::new(),
            connectivity: Vec::new(),
            degraded: true,
        }
    }

    /// Fraction of probes that succeeded, in [0,1]. None if no probes.
    pub fn availability(&self) -> Option<f64> {
        if self.probes.is_empty() {
            return None;
        }
        let ok = self.probes.values().filter(|p| p.success).count();
        Some(ok as f64 / self.probes.len() as f64)
    }

    /// Fraction of probes that failed, in [0,1]. None if no probes.
    pub fn error_rate(&self) -> Option<f64> {
        self.availability().map(|a| 1.0 - a)
    }

    /// Mean latency of successful probes in seconds. None if none succeeded.
    pub fn mean_response_time_secs(&self) -> Option<f64> {
        let ok: Vec<f64> = self
            .probes
            .values()
            .filter(|p| p.success)
            .map(|p| p.latency_ms / 1000.0)
            .collect();
        if ok.is_empty() {
            None
        } else {
            Some(ok.iter().sum::<f64>() / ok.len() as f64)
        }
    }
}
