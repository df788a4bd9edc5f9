//! Infrastructure state snapshots taken by the evidence collector.

use serde::{Deserialize, Serialize};

/// State of one component at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    /// Component name.
    pub name: String,
    /// Container id.
    pub container_id: String,
    /// Container status string as reported by the orchestrator.
    pub status: String,
    /// Last observed health state.
    pub healthy: bool,
    /// Published ports.
    pub ports: Vec<String>,
}

/// State of one network at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Network name.
    pub name: String,
    /// Network id.
    pub id: String,
    /// Network driver.
    pub driver: String,
    /// Number of attached containers.
    pub member_count: usize,
}

/// Host-level resource roll-up across all components.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostMetrics {
    /// Sum of component CPU usage percentages.
    pub total_cpu_percent: f64,
    /// Sum of component memory usage in bytes.
    pub total_memory_bytes: u64,
    /// Number of components the roll-up covers.
    pub component_count: usize,
}

/// Point-in-time snapshot of the test infrastructure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraSnapshot {
    /// Snapshot label, e.g. `pre_injection` or `post_heal`.
    pub label: String,
    /// Unix timestamp in milliseconds.
    pub taken_at_ms: u64,
    /// Per-component state.
    pub components: Vec<ComponentSnapshot>,
    /// Per-network state.
    pub networks: Vec<NetworkSnapshot>,
    /// Host resource roll-up.
    pub host: HostMetrics,
}
