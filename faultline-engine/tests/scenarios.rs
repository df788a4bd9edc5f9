//! End-to-end scenario executions against the mock orchestrator.

use faultline_engine::{ChaosEngine, EngineConfig, MockOrchestrator, MockProbe};
use faultline_types::{
    ChaosScenario, ChaosTestResult, ComponentKind, ComponentSpec, ConfidenceLevel,
    InfrastructureSpec, ScenarioKind,
};
use std::path::Path;
use std::sync::Arc;

fn topology() -> InfrastructureSpec {
    InfrastructureSpec::new(vec![ComponentSpec::new(
        "broker",
        ComponentKind::Broker,
        "example/broker:latest",
        "broker:9092",
    )])
    .with_workload(
        ComponentSpec::new(
            "workload-{n}",
            ComponentKind::Workload,
            "example/workload:latest",
            "workload-{n}:8080",
        ),
        2,
    )
}

fn engine(mock: &MockOrchestrator, probe: &MockProbe, dir: &Path) -> ChaosEngine {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut config = EngineConfig::default();
    config.timing.monitor_interval_secs = 5;
    config.timing.recovery_poll_interval_secs = 1;
    config.timing.health_poll_interval_secs = 1;
    ChaosEngine::new(
        config,
        Arc::new(mock.clone()),
        Arc::new(probe.clone()),
        dir,
    )
    .unwrap()
}

fn link_probes(mock: &MockOrchestrator, probe: &MockProbe) {
    for (name, endpoint) in [
        ("broker", "broker:9092"),
        ("workload-1", "workload-1:8080"),
        ("workload-2", "workload-2:8080"),
    ] {
        probe.link_container(&format!("http://{endpoint}/health"), mock, name);
    }
}

#[tokio::test(start_paused = true)]
async fn network_partition_happy_path() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenario = ChaosScenario::new("workload-partition", ScenarioKind::NetworkPartition)
        .targets(&["workload-1", "workload-2"])
        .duration_secs(10)
        .recovery_time_limit_secs(30)
        .expected_behavior("workloads keep serving from local state");

    let result = engine.run_scenario(&topology(), &scenario).await.unwrap();

    assert!(result.completed);
    assert!(result.failure_injection_successful);
    assert!(result.recovery_successful);
    assert!(result.recovery_time_secs < 2.0);
    // Health endpoints kept answering throughout the partition.
    assert!((result.resilience.availability_score - 1.0).abs() < 1e-9);
    assert!(result.resilience.overall_score > 0.9);
    // 10s window at 5s ticks.
    assert!(result.samples.len() >= 2);
    // Both snapshots present and everything back on one network afterwards.
    let after = result.after.as_ref().unwrap();
    assert_eq!(after.networks.len(), 1);
    assert_eq!(after.networks[0].member_count, 3);
}

#[tokio::test(start_paused = true)]
async fn service_failure_of_one_workload() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    link_probes(&mock, &probe);
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenario = ChaosScenario::new("workload-outage", ScenarioKind::ServiceFailure)
        .targets(&["workload-1"])
        .duration_secs(30)
        .recovery_time_limit_secs(30);

    let result = engine.run_scenario(&topology(), &scenario).await.unwrap();

    // Exactly the one target was stopped and restarted during the scenario;
    // teardown stops everything afterwards, so only look at calls up to the
    // heal's restart.
    let calls = mock.calls();
    let restart = calls
        .iter()
        .position(|c| c == "start_container workload-1")
        .unwrap();
    let stops = |name: &str| {
        calls[..restart]
            .iter()
            .filter(|c| **c == format!("stop_container {name}"))
            .count()
    };
    assert_eq!(stops("workload-1"), 1);
    assert_eq!(stops("workload-2"), 0);
    assert_eq!(stops("broker"), 0);
    assert_eq!(mock.count_calls("start_container"), 1);

    // One of three components down during the window.
    let availability = result.resilience.availability_score;
    assert!(availability < 0.9);
    assert!(availability > 0.5);
    assert!(result.recovery_successful);

    // Every sample shows the stopped component unhealthy.
    for sample in &result.samples {
        assert!(!sample.probes["workload-1"].success);
        assert!(sample.probes["workload-2"].success);
    }
}

#[tokio::test(start_paused = true)]
async fn resource_exhaustion_degrades_scores() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenario = ChaosScenario::new("memory-squeeze", ScenarioKind::ResourceExhaustion)
        .targets(&["workload-1", "workload-2"])
        .failure_percent(25.0)
        .duration_secs(30)
        .recovery_time_limit_secs(30);

    let infra = topology();
    let probe_handle = probe.clone();
    let run = tokio::spawn(async move { engine.run_scenario(&infra, &scenario).await });

    // The squeezed workloads start failing their health checks shortly
    // after injection and do not come back within the recovery limit.
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    probe_handle.set_response("http://workload-1:8080/health", 503, 50);
    probe_handle.set_response("http://workload-2:8080/health", 503, 50);

    let result = run.await.unwrap().unwrap();

    assert!(result.failure_injection_successful);
    assert!(result.resilience.error_rate_stats.mean > 0.0);
    assert!(result.resilience.availability_score < 1.0);
    assert!(result.resilience.overall_score < 0.8);
    assert!(!result.recovery_successful);
    assert_eq!(result.recovery_time_secs, 30.0);
    // Limits applied and restored once each per target.
    assert_eq!(mock.count_calls("update_resources workload-1"), 2);
    assert_eq!(mock.count_calls("update_resources workload-2"), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_injection_skips_heal_but_still_collects_evidence() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenario = ChaosScenario::new("ghost-target", ScenarioKind::ServiceFailure)
        .targets(&["ghost"])
        .duration_secs(30);

    let result = engine.run_scenario(&topology(), &scenario).await.unwrap();

    assert!(!result.failure_injection_successful);
    assert!(!result.completed);
    assert!(result.samples.is_empty());
    assert_eq!(result.resilience.confidence, ConfidenceLevel::Low);
    assert_eq!(mock.count_calls("stop_container ghost"), 0);
    assert_eq!(mock.count_calls("start_container"), 0);
    // Evidence still written for the degraded run.
    assert!(result
        .evidence_artifacts
        .iter()
        .any(|a| a.ends_with("report.json")));
    for artifact in &result.evidence_artifacts {
        assert!(dir.path().join(artifact).is_file());
    }
}

#[tokio::test(start_paused = true)]
async fn persisted_report_round_trips() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenario = ChaosScenario::new("roundtrip", ScenarioKind::NetworkPartition)
        .targets(&["workload-1"])
        .duration_secs(10)
        .recovery_time_limit_secs(10);

    let result = engine.run_scenario(&topology(), &scenario).await.unwrap();

    let report_rel = result
        .evidence_artifacts
        .iter()
        .find(|a| a.ends_with("report.json"))
        .unwrap();
    let json = std::fs::read_to_string(dir.path().join(report_rel)).unwrap();
    let report: ChaosTestResult = serde_json::from_str(&json).unwrap();

    assert_eq!(report.scenario.name, "roundtrip");
    assert_eq!(report.correlation_id, result.correlation_id);
    assert_eq!(report.samples.len(), result.samples.len());
    assert_eq!(report.resilience, result.resilience);
    assert_eq!(report.evidence_artifacts, result.evidence_artifacts);

    // Log tails were persisted for every component.
    for name in ["broker", "workload-1", "workload-2"] {
        assert!(report
            .evidence_artifacts
            .iter()
            .any(|a| a.ends_with(&format!("logs/{name}.log"))));
    }
}

#[tokio::test(start_paused = true)]
async fn batch_runs_all_scenarios_on_one_topology() {
    let mock = MockOrchestrator::new();
    let probe = MockProbe::new();
    link_probes(&mock, &probe);
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&mock, &probe, dir.path());

    let scenarios = vec![
        ChaosScenario::new("first", ScenarioKind::ServiceFailure)
            .targets(&["workload-1"])
            .duration_secs(10)
            .recovery_time_limit_secs(20),
        ChaosScenario::new("second", ScenarioKind::NetworkPartition)
            .targets(&["workload-2"])
            .duration_secs(10)
            .recovery_time_limit_secs(20),
    ];

    let results = engine.run_scenarios(&topology(), &scenarios).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.completed));
    assert!(results.iter().all(|r| r.recovery_successful));
    // Correlation ids are distinct per execution.
    assert_ne!(results[0].correlation_id, results[1].correlation_id);
    // Topology provisioned once, torn down once. The partition heal removes
    // its isolated network; teardown removes the shared one.
    assert_eq!(mock.count_calls("run_container"), 3);
    let removals: Vec<String> = mock
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("remove_network"))
        .collect();
    assert_eq!(removals.len(), 2);
    assert_eq!(removals.iter().filter(|c| c.ends_with("-isolated")).count(), 1);
    // Healed between scenarios: workload-1 running again before the end.
    assert_eq!(mock.container_running("workload-1"), None); // removed by teardown
    assert_eq!(mock.count_calls("start_container workload-1"), 1);
}
