//! Chaos scenario definitions.
//!
//! A [`ChaosScenario`] is an immutable fault-injection experiment definition
//! supplied by the caller. The engine executes it faithfully; it never decides
//! what to test.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The kind of failure a scenario injects.
///
/// Closed set: new failure modes are new variants, dispatched via `match`
/// in the executor, never string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Move target components onto an isolated network.
    NetworkPartition,
    /// Apply constrained memory/CPU limits to targets.
    ResourceExhaustion,
    /// Stop target containers outright.
    ServiceFailure,
}

impl ScenarioKind {
    /// Stable snake_case name, used in artifact keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::NetworkPartition => "network_partition",
            ScenarioKind::ResourceExhaustion => "resource_exhaustion",
            ScenarioKind::ServiceFailure => "service_failure",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fault-injection experiment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosScenario {
    /// Scenario name, used in artifact keys (keep filesystem-safe).
    pub name: String,
    /// Failure kind to inject.
    pub kind: ScenarioKind,
    /// How long the failure stays active (monitoring window).
    pub duration_secs: u64,
    /// Names of the components the failure targets.
    pub targets: Vec<String>,
    /// Failure intensity in percent (meaning depends on kind, e.g. the
    /// fraction of the original memory limit left available).
    pub failure_percent: f64,
    /// Hard timeout for post-heal recovery polling.
    pub recovery_time_limit_secs: u64,
    /// Human description of the behavior the system is expected to show.
    pub expected_behavior: String,
}

impl ChaosScenario {
    /// Create a scenario with the given name and kind; other fields take
    /// conservative defaults and can be set with the builder methods.
    pub fn new(name: &str, kind: ScenarioKind) -> Self {
        Self {
            name: name.into(),
            kind,
            duration_secs: 30,
            targets: Vec::new(),
            failure_percent: 50.0,
            recovery_time_limit_secs: 60,
            expected_behavior: String::new(),
        }
    }

    /// Set the failure duration in seconds.
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Set the target component names.
    pub fn targets(mut self, targets: &[&str]) -> Self {
        self.targets = targets.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the failure intensity percentage.
    pub fn failure_percent(mut self, percent: f64) -> Self {
        self.failure_percent = percent;
        self
    }

    /// Set the recovery time limit in seconds.
    pub fn recovery_time_limit_secs(mut self, secs: u64) -> Self {
        self.recovery_time_limit_secs = secs;
        self
    }

    /// Set the expected-behavior description.
    pub fn expected_behavior(mut self, text: &str) -> Self {
        self.expected_behavior = text.into();
        self
    }

    /// Failure duration as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Recovery time limit as a [`Duration`].
    pub fn recovery_time_limit(&self) -> Duration {
        Duration::from_secs(self.recovery_time_limit_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScenarioKind::NetworkPartition).unwrap();
        assert_eq!(json, "\"network_partition\"");

        let back: ScenarioKind = serde_json::from_str("\"service_failure\"").unwrap();
        assert_eq!(back, ScenarioKind::ServiceFailure);
    }

    #[test]
    fn kind_display_matches_serde() {
        for kind in [
            ScenarioKind::NetworkPartition,
            ScenarioKind::ResourceExhaustion,
            ScenarioKind::ServiceFailure,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn builder_sets_fields() {
        let scenario = ChaosScenario::new("broker-partition", ScenarioKind::NetworkPartition)
            .duration_secs(10)
            .targets(&["broker-1", "broker-2"])
            .recovery_time_limit_secs(30)
            .expected_behavior("clients fail over to the surviving broker");

        assert_eq!(scenario.name, "broker-partition");
        assert_eq!(scenario.duration(), Duration::from_secs(10));
        assert_eq!(scenario.targets, vec!["broker-1", "broker-2"]);
        assert_eq!(scenario.recovery_time_limit(), Duration::from_secs(30));
    }

    #[test]
    fn scenario_json_round_trip() {
        let scenario = ChaosScenario::new("mem-squeeze", ScenarioKind::ResourceExhaustion)
            .targets(&["workload-1"])
            .failure_percent(25.0);

        let json = serde_json::to_string(&scenario).unwrap();
        let back: ChaosScenario = serde_json::from_str(&json).unwrap();
        assert_eq!(scenario, back);
    }
}
