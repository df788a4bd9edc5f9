//! Per-execution chaos test result record.

use crate::{BehaviorSample, ChaosScenario, CorrelationId, InfraSnapshot, ResilienceMetrics};
use serde::{Deserialize, Serialize};

/// Complete record of one scenario execution.
///
/// Produced exactly once per execution and persisted as JSON. Degraded
/// executions (failed injection, cancellation) still produce a result;
/// only provisioning failure aborts without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosTestResult {
    /// The scenario that was executed.
    pub scenario: ChaosScenario,
    /// Correlation id threaded through all logs and artifacts.
    pub correlation_id: CorrelationId,
    /// Execution start, unix milliseconds.
    pub started_at_ms: u64,
    /// Execution end, unix milliseconds.
    pub ended_at_ms: u64,
    /// Infrastructure snapshot taken before injection.
    pub before: Option<InfraSnapshot>,
    /// Infrastructure snapshot taken after healing.
    pub after: Option<InfraSnapshot>,
    /// Whether failure injection succeeded.
    pub failure_injection_successful: bool,
    /// Behavior samples collected while the failure was active.
    pub samples: Vec<BehaviorSample>,
    /// Whether all components recovered within the scenario's limit.
    pub recovery_successful: bool,
    /// Measured recovery time in seconds (limit value on timeout).
    pub recovery_time_secs: f64,
    /// Resilience measurement computed from the samples.
    pub resilience: ResilienceMetrics,
    /// Identifiers of the persisted evidence artifacts.
    pub evidence_artifacts: Vec<String>,
    /// False if the execution was cancelled before running to completion.
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenarioKind;

    #[test]
    fn result_json_round_trip_preserves_key_fields() {
        let scenario = ChaosScenario::new("partition-test", ScenarioKind::NetworkPartition)
            .targets(&["broker-1"]);
        let result = ChaosTestResult {
            scenario,
            correlation_id: CorrelationId::new(),
            started_at_ms: 1_700_000_000_000,
            ended_at_ms: 1_700_000_060_000,
            before: None,
            after: None,
            failure_injection_successful: true,
            samples: Vec::new(),
            recovery_successful: true,
            recovery_time_secs: 4.2,
            resilience: ResilienceMetrics::empty(),
            evidence_artifacts: vec![
                "partition-test_1700000000/report.json".into(),
                "partition-test_1700000000/logs/broker-1.log".into(),
            ],
            completed: true,
        };

        let json = serde_json::to_string_pretty(&result).unwrap();
        let back: ChaosTestResult = serde_json::from_str(&json).unwrap();

        assert_eq!(back.scenario.name, "partition-test");
        assert_eq!(back.evidence_artifacts, result.evidence_artifacts);
        assert!((back.recovery_time_secs - result.recovery_time_secs).abs() < 1e-9);
        assert_eq!(back, result);
    }
}
