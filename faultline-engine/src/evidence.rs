//! Evidence collection and persistence.
//!
//! Takes infrastructure snapshots around the failure window and persists the
//! execution record, a network analysis document, and component log tails
//! under one directory per execution. Evidence collection is best effort: a
//! failed artifact becomes a placeholder, never an abort.

use crate::config::TimingConfig;
use crate::context::{unix_ms, unix_secs, RunContext};
use crate::error::EvidenceError;
use crate::orchestrator::ContainerOrchestrator;
use crate::provision::ComponentRegistry;
use faultline_types::{
    ChaosTestResult, ComponentSnapshot, ConnectivityEntry, HostMetrics, InfraSnapshot,
    NetworkSnapshot,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collects snapshots and persists execution artifacts.
pub struct EvidenceCollector {
    orchestrator: Arc<dyn ContainerOrchestrator>,
    registry: ComponentRegistry,
    network_name: String,
    log_tail_lines: usize,
    base_dir: PathBuf,
}

impl EvidenceCollector {
    /// Create a collector writing under `base_dir`.
    pub fn new(
        orchestrator: Arc<dyn ContainerOrchestrator>,
        registry: ComponentRegistry,
        network_name: &str,
        timing: &TimingConfig,
        base_dir: &Path,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            network_name: network_name.to_string(),
            log_tail_lines: timing.log_tail_lines,
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Take a labeled point-in-time snapshot of the infrastructure.
    ///
    /// Components the orchestrator cannot inspect appear with an
    /// `unavailable` status rather than being dropped.
    pub async fn snapshot(&self, label: &str, ctx: &RunContext) -> InfraSnapshot {
        let mut components = Vec::new();
        let mut host = HostMetrics::default();

        let known: Vec<(String, String, bool)> = self
            .registry
            .iter()
            .map(|e| (e.name.clone(), e.container_id.clone(), e.healthy))
            .collect();

        for (name, container_id, healthy) in known {
            let (status, ports) = match self.orchestrator.inspect_container(&name).await {
                Ok(state) => (state.status, state.ports),
                Err(e) => {
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id,
                        component = %name,
                        error = %e,
                        "Snapshot inspect failed"
                    );
                    ("unavailable".to_string(), Vec::new())
                }
            };

            if let Ok(stats) = self.orchestrator.stats(&name).await {
                host.total_cpu_percent += stats.cpu_percent;
                host.total_memory_bytes += stats.memory_bytes;
            }
            host.component_count += 1;

            components.push(ComponentSnapshot {
                name,
                container_id,
                status,
                healthy,
                ports,
            });
        }

        let networks = match self.orchestrator.inspect_network(&self.network_name).await {
            Ok(state) => vec![NetworkSnapshot {
                name: self.network_name.clone(),
                id: state.id,
                driver: state.driver,
                member_count: state.members.len(),
            }],
            Err(e) => {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id,
                    network = %self.network_name,
                    error = %e,
                    "Snapshot network inspect failed"
                );
                Vec::new()
            }
        };

        InfraSnapshot {
            label: label.to_string(),
            taken_at_ms: unix_ms(),
            components,
            networks,
            host,
        }
    }

    /// Persist all artifacts for one execution and fill in
    /// `result.evidence_artifacts` with their relative paths.
    ///
    /// Persisting writes, in order: per-component log tails, the network
    /// analysis document, and finally `report.json` containing the complete
    /// result including the artifact list. Each failed artifact is logged
    /// and skipped; the remaining artifacts are still written.
    pub async fn persist(&self, result: &mut ChaosTestResult, ctx: &RunContext) -> Vec<String> {
        let dir_name = format!("{}_{}", ctx.scenario_name, unix_secs());
        let dir = self.base_dir.join(&dir_name);
        let mut artifacts = Vec::new();

        if let Err(e) = tokio::fs::create_dir_all(dir.join("logs")).await {
            let error = EvidenceError::Write {
                artifact: dir_name.clone(),
                source: e,
            };
            tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Evidence directory unavailable");
            return artifacts;
        }

        let names: Vec<String> = self.registry.iter().map(|e| e.name.clone()).collect();
        for name in names {
            let content = match self
                .orchestrator
                .logs(&name, self.log_tail_lines, true)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    let error = EvidenceError::Orchestrator {
                        artifact: format!("logs/{name}.log"),
                        source: e,
                    };
                    tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Log tail unavailable");
                    format!("logs unavailable for {name}\n")
                }
            };

            let rel = format!("{dir_name}/logs/{name}.log");
            match tokio::fs::write(self.base_dir.join(&rel), content).await {
                Ok(()) => artifacts.push(rel),
                Err(e) => {
                    let error = EvidenceError::Write {
                        artifact: rel,
                        source: e,
                    };
                    tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Artifact skipped");
                }
            }
        }

        let analysis = self.network_analysis(result, ctx);
        let rel = format!("{dir_name}/network_analysis.json");
        match self.write_json(&rel, &analysis, ctx).await {
            Ok(()) => artifacts.push(rel),
            Err(()) => {}
        }

        // report.json goes last so it can include the full artifact list.
        let rel = format!("{dir_name}/report.json");
        artifacts.push(rel.clone());
        result.evidence_artifacts = artifacts.clone();
        match serde_json::to_value(&*result) {
            Ok(doc) => {
                if self.write_json(&rel, &doc, ctx).await.is_err() {
                    artifacts.pop();
                    result.evidence_artifacts = artifacts.clone();
                }
            }
            Err(e) => {
                let error = EvidenceError::Serialize {
                    artifact: rel,
                    source: e,
                };
                tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Report skipped");
                artifacts.pop();
                result.evidence_artifacts = artifacts.clone();
            }
        }

        tracing::info!(
            correlation_id = %ctx.correlation_id,
            directory = %dir.display(),
            artifacts = artifacts.len(),
            "Evidence persisted"
        );
        artifacts
    }

    async fn write_json(
        &self,
        rel: &str,
        doc: &serde_json::Value,
        ctx: &RunContext,
    ) -> Result<(), ()> {
        let content = match serde_json::to_string_pretty(doc) {
            Ok(c) => c,
            Err(e) => {
                let error = EvidenceError::Serialize {
                    artifact: rel.to_string(),
                    source: e,
                };
                tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Artifact skipped");
                return Err(());
            }
        };
        tokio::fs::write(self.base_dir.join(rel), content).await.map_err(|e| {
            let error = EvidenceError::Write {
                artifact: rel.to_string(),
                source: e,
            };
            tracing::warn!(correlation_id = %ctx.correlation_id, %error, "Artifact skipped");
        })
    }

    /// Build the network analysis document from the collected samples:
    /// observed topology, aggregated pairwise reachability, and the pairs
    /// that stayed isolated for the whole window.
    fn network_analysis(&self, result: &ChaosTestResult, ctx: &RunContext) -> serde_json::Value {
        let mut observed: BTreeMap<(String, String), (usize, usize)> = BTreeMap::new();
        for sample in &result.samples {
            for ConnectivityEntry { from, to, reachable } in &sample.connectivity {
                let entry = observed.entry((from.clone(), to.clone())).or_insert((0, 0));
                entry.0 += 1;
                if *reachable {
                    entry.1 += 1;
                }
            }
        }

        let connectivity: Vec<serde_json::Value> = observed
            .iter()
            .map(|((from, to), (total, reachable))| {
                json!({
                    "from": from,
                    "to": to,
                    "observations": total,
                    "reachable": reachable,
                })
            })
            .collect();

        let isolated_pairs: Vec<serde_json::Value> = observed
            .iter()
            .filter(|(_, (_, reachable))| *reachable == 0)
            .map(|((from, to), _)| json!({ "from": from, "to": to }))
            .collect();

        let components: Vec<String> = self.registry.iter().map(|e| e.name.clone()).collect();

        json!({
            "correlation_id": ctx.correlation_id.to_string(),
            "scenario": result.scenario.name,
            "kind": result.scenario.kind.as_str(),
            "topology": {
                "network": self.network_name,
                "components": components,
            },
            "connectivity": connectivity,
            "isolated_pairs": isolated_pairs,
            "samples": result.samples.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::orchestrator::MockOrchestrator;
    use crate::probe::MockProbe;
    use crate::provision::InfrastructureProvisioner;
    use faultline_types::{
        BehaviorSample, ChaosScenario, ComponentKind, ComponentSpec, CorrelationId,
        InfrastructureSpec, ResilienceMetrics, ResourceStats, ScenarioKind,
    };

    async fn provisioned(mock: &MockOrchestrator) -> (ComponentRegistry, String) {
        let config = EngineConfig::default();
        let provisioner = InfrastructureProvisioner::new(
            Arc::new(mock.clone()),
            Arc::new(MockProbe::new()),
            &config,
        );
        let spec = InfrastructureSpec::new(vec![
            ComponentSpec::new("broker", ComponentKind::Broker, "img", "broker:9092"),
            ComponentSpec::new("workload-1", ComponentKind::Workload, "img", "workload-1:80"),
        ]);
        let ctx = RunContext::new("evidence-test");
        let registry = provisioner.provision(&spec, &ctx).await.unwrap();
        (registry, provisioner.network_name().to_string())
    }

    fn result_for(name: &str) -> ChaosTestResult {
        ChaosTestResult {
            scenario: ChaosScenario::new(name, ScenarioKind::NetworkPartition),
            correlation_id: CorrelationId::new(),
            started_at_ms: unix_ms(),
            ended_at_ms: unix_ms(),
            before: None,
            after: None,
            failure_injection_successful: true,
            samples: Vec::new(),
            recovery_successful: true,
            recovery_time_secs: 0.5,
            resilience: ResilienceMetrics::empty(),
            evidence_artifacts: Vec::new(),
            completed: true,
        }
    }

    #[tokio::test]
    async fn snapshot_covers_all_components_and_the_network() {
        let mock = MockOrchestrator::new();
        let (registry, network) = provisioned(&mock).await;
        mock.set_stats(
            "broker",
            ResourceStats {
                cpu_percent: 10.0,
                memory_bytes: 512,
                memory_limit_bytes: 0,
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let collector = EvidenceCollector::new(
            Arc::new(mock),
            registry,
            &network,
            &EngineConfig::default().timing,
            dir.path(),
        );

        let ctx = RunContext::new("evidence-test");
        let snap = collector.snapshot("pre_injection", &ctx).await;

        assert_eq!(snap.label, "pre_injection");
        assert_eq!(snap.components.len(), 2);
        assert!(snap.components.iter().all(|c| c.status == "running"));
        assert_eq!(snap.networks.len(), 1);
        assert_eq!(snap.networks[0].member_count, 2);
        assert_eq!(snap.host.component_count, 2);
        assert!(snap.host.total_cpu_percent >= 10.0);
    }

    #[tokio::test]
    async fn snapshot_survives_inspect_failure() {
        let mock = MockOrchestrator::new();
        let (registry, network) = provisioned(&mock).await;
        mock.fail_next("inspect_container", "daemon busy");

        let dir = tempfile::tempdir().unwrap();
        let collector = EvidenceCollector::new(
            Arc::new(mock),
            registry,
            &network,
            &EngineConfig::default().timing,
            dir.path(),
        );

        let ctx = RunContext::new("evidence-test");
        let snap = collector.snapshot("post_heal", &ctx).await;
        assert_eq!(snap.components.len(), 2);
        assert!(snap.components.iter().any(|c| c.status == "unavailable"));
    }

    #[tokio::test]
    async fn persist_writes_report_logs_and_analysis() {
        let mock = MockOrchestrator::new();
        let (registry, network) = provisioned(&mock).await;
        mock.set_logs("broker", "2024-01-01T00:00:00Z starting\n");

        let dir = tempfile::tempdir().unwrap();
        let collector = EvidenceCollector::new(
            Arc::new(mock),
            registry,
            &network,
            &EngineConfig::default().timing,
            dir.path(),
        );

        let ctx = RunContext::new("partition-a");
        let mut result = result_for("partition-a");
        let artifacts = collector.persist(&mut result, &ctx).await;

        // Two logs + analysis + report.
        assert_eq!(artifacts.len(), 4);
        assert!(artifacts.iter().any(|a| a.ends_with("report.json")));
        assert!(artifacts.iter().any(|a| a.ends_with("network_analysis.json")));
        assert!(artifacts.iter().any(|a| a.ends_with("logs/broker.log")));
        assert_eq!(result.evidence_artifacts, artifacts);

        for artifact in &artifacts {
            assert!(dir.path().join(artifact).is_file());
        }

        let report_path = dir
            .path()
            .join(artifacts.iter().find(|a| a.ends_with("report.json")).unwrap());
        let report: ChaosTestResult =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(report.scenario.name, "partition-a");
        assert_eq!(report.evidence_artifacts, artifacts);

        let log_path = dir
            .path()
            .join(artifacts.iter().find(|a| a.ends_with("broker.log")).unwrap());
        let log = std::fs::read_to_string(log_path).unwrap();
        assert!(log.contains("starting"));
    }

    #[tokio::test]
    async fn failed_log_collection_becomes_placeholder() {
        let mock = MockOrchestrator::new();
        let (registry, network) = provisioned(&mock).await;
        mock.fail_next("logs", "daemon busy");

        let dir = tempfile::tempdir().unwrap();
        let collector = EvidenceCollector::new(
            Arc::new(mock),
            registry,
            &network,
            &EngineConfig::default().timing,
            dir.path(),
        );

        let ctx = RunContext::new("partition-a");
        let mut result = result_for("partition-a");
        let artifacts = collector.persist(&mut result, &ctx).await;

        // All artifacts still present; one log holds a placeholder.
        assert_eq!(artifacts.len(), 4);
        let contents: Vec<String> = artifacts
            .iter()
            .filter(|a| a.ends_with(".log"))
            .map(|a| std::fs::read_to_string(dir.path().join(a)).unwrap())
            .collect();
        assert!(contents.iter().any(|c| c.contains("logs unavailable")));
    }

    #[tokio::test]
    async fn analysis_reports_isolated_pairs() {
        let mock = MockOrchestrator::new();
        let (registry, network) = provisioned(&mock).await;

        let dir = tempfile::tempdir().unwrap();
        let collector = EvidenceCollector::new(
            Arc::new(mock),
            registry,
            &network,
            &EngineConfig::default().timing,
            dir.path(),
        );

        let ctx = RunContext::new("partition-b");
        let mut result = result_for("partition-b");
        let mut sample = BehaviorSample::empty(unix_ms());
        sample.connectivity.push(ConnectivityEntry {
            from: "workload-1".into(),
            to: "workload-2".into(),
            reachable: false,
        });
        sample.connectivity.push(ConnectivityEntry {
            from: "workload-2".into(),
            to: "workload-1".into(),
            reachable: true,
        });
        result.samples.push(sample);

        let artifacts = collector.persist(&mut result, &ctx).await;
        let analysis_path = dir.path().join(
            artifacts
                .iter()
                .find(|a| a.ends_with("network_analysis.json"))
                .unwrap(),
        );
        let analysis: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(analysis_path).unwrap()).unwrap();

        let isolated = analysis["isolated_pairs"].as_array().unwrap();
        assert_eq!(isolated.len(), 1);
        assert_eq!(isolated[0]["from"], "workload-1");
        assert_eq!(analysis["connectivity"].as_array().unwrap().len(), 2);
    }
}
