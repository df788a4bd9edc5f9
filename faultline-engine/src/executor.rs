//! Scenario executor.
//!
//! Drives one scenario through its phases: baseline snapshot, failure
//! injection, concurrent behavior monitoring, healing, and recovery
//! verification. Healing runs exactly once after a successful injection on
//! every path, including cancellation; a failed injection skips healing and
//! produces a degraded result instead of an error.

use crate::analyzer::ResilienceAnalyzer;
use crate::config::EngineConfig;
use crate::context::{unix_ms, RunContext};
use crate::error::{HealError, InjectionError};
use crate::evidence::EvidenceCollector;
use crate::monitor::BehaviorMonitor;
use crate::orchestrator::{ContainerOrchestrator, ResourceLimits};
use crate::probe::HttpProbe;
use crate::provision::ComponentRegistry;
use crate::recovery::{RecoveryOutcome, RecoveryWaiter};
use faultline_types::{ChaosScenario, ChaosTestResult, ResilienceMetrics, ScenarioKind};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Memory cap base applied when an exhaustion target had no limit configured.
const EXHAUSTION_BASE_MEMORY_BYTES: i64 = 512 * 1024 * 1024;
/// CPU cap base (one full CPU) applied when a target had no limit configured.
const EXHAUSTION_BASE_NANO_CPUS: i64 = 1_000_000_000;

/// Execution phase, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    BaselineCaptured,
    Injecting,
    Injected,
    Monitoring,
    Healing,
    Healed,
    Verified,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::BaselineCaptured => "baseline_captured",
            Phase::Injecting => "injecting",
            Phase::Injected => "injected",
            Phase::Monitoring => "monitoring",
            Phase::Healing => "healing",
            Phase::Healed => "healed",
            Phase::Verified => "verified",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What the injection actually did, carried into the heal so it reverses
/// exactly the applied change.
enum InjectedState {
    NetworkPartition {
        isolated_network: String,
        targets: Vec<String>,
    },
    ResourceExhaustion {
        original: Vec<(String, ResourceLimits)>,
    },
    ServiceFailure {
        stopped: Vec<String>,
    },
}

/// Executes one scenario against provisioned infrastructure.
pub struct ScenarioExecutor {
    orchestrator: Arc<dyn ContainerOrchestrator>,
    probe: Arc<dyn HttpProbe>,
    registry: ComponentRegistry,
    network_name: String,
    config: EngineConfig,
    evidence: EvidenceCollector,
}

impl ScenarioExecutor {
    /// Create an executor over already-provisioned infrastructure.
    pub fn new(
        orchestrator: Arc<dyn ContainerOrchestrator>,
        probe: Arc<dyn HttpProbe>,
        registry: ComponentRegistry,
        network_name: &str,
        config: EngineConfig,
        evidence: EvidenceCollector,
    ) -> Self {
        Self {
            orchestrator,
            probe,
            registry,
            network_name: network_name.to_string(),
            config,
            evidence,
        }
    }

    /// Execute the scenario to completion.
    ///
    /// Always returns a result. Flipping `cancel` to true ends the
    /// monitoring window early; healing and recovery verification still run
    /// and the result is marked not completed.
    pub async fn execute(
        &self,
        scenario: &ChaosScenario,
        mut cancel: watch::Receiver<bool>,
        ctx: &RunContext,
    ) -> ChaosTestResult {
        let started_at_ms = unix_ms();
        let mut phase = Phase::Idle;
        self.transition(&mut phase, Phase::BaselineCaptured, ctx);

        let before = self.evidence.snapshot("pre_injection", ctx).await;

        self.transition(&mut phase, Phase::Injecting, ctx);
        let injected = match self.inject(scenario, ctx).await {
            Ok(state) => {
                self.transition(&mut phase, Phase::Injected, ctx);
                Some(state)
            }
            Err(e) => {
                self.transition(&mut phase, Phase::Failed, ctx);
                tracing::error!(
                    correlation_id = %ctx.correlation_id,
                    scenario = %scenario.name,
                    error = %e,
                    "Injection failed; producing degraded result"
                );
                None
            }
        };

        let mut cancelled = false;
        let mut samples = Vec::new();
        let mut recovery = RecoveryOutcome {
            recovered: false,
            recovery_time_secs: 0.0,
        };

        if let Some(state) = injected {
            self.transition(&mut phase, Phase::Monitoring, ctx);
            let monitor = BehaviorMonitor::new(
                Arc::clone(&self.orchestrator),
                Arc::clone(&self.probe),
                Arc::clone(&self.registry),
                self.config.timing.clone(),
            );
            let handle = monitor.spawn(scenario.duration(), cancel.clone(), ctx.clone());

            let cancel_requested = async {
                loop {
                    if *cancel.borrow() {
                        return;
                    }
                    if cancel.changed().await.is_err() {
                        // Sender gone: cancellation can never arrive.
                        std::future::pending::<()>().await;
                    }
                }
            };
            tokio::select! {
                _ = tokio::time::sleep(scenario.duration()) => {}
                _ = cancel_requested => {
                    cancelled = true;
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id,
                        scenario = %scenario.name,
                        "Execution cancelled; healing before exit"
                    );
                }
            }

            // Heal runs on every path once injection succeeded.
            self.transition(&mut phase, Phase::Healing, ctx);
            self.heal(&state, ctx).await;
            self.transition(&mut phase, Phase::Healed, ctx);

            samples = match handle.await {
                Ok(samples) => samples,
                Err(e) => {
                    tracing::error!(
                        correlation_id = %ctx.correlation_id,
                        error = %e,
                        "Monitor task failed; continuing without samples"
                    );
                    Vec::new()
                }
            };

            recovery = RecoveryWaiter::new(
                Arc::clone(&self.probe),
                Arc::clone(&self.registry),
                self.config.timing.clone(),
            )
            .wait(scenario.recovery_time_limit(), ctx)
            .await;
            self.transition(&mut phase, Phase::Verified, ctx);
        }

        let after = self.evidence.snapshot("post_heal", ctx).await;

        let resilience = if phase == Phase::Verified {
            ResilienceAnalyzer::new(self.config.scoring.clone()).analyze(
                &samples,
                &[recovery.recovery_time_secs],
                scenario.duration_secs as f64,
            )
        } else {
            ResilienceMetrics::empty()
        };

        let mut result = ChaosTestResult {
            scenario: scenario.clone(),
            correlation_id: ctx.correlation_id,
            started_at_ms,
            ended_at_ms: unix_ms(),
            before: Some(before),
            after: Some(after),
            failure_injection_successful: phase != Phase::Failed,
            samples,
            recovery_successful: recovery.recovered,
            recovery_time_secs: recovery.recovery_time_secs,
            resilience,
            evidence_artifacts: Vec::new(),
            completed: !cancelled && phase != Phase::Failed,
        };

        self.evidence.persist(&mut result, ctx).await;

        if phase != Phase::Failed {
            self.transition(&mut phase, Phase::Done, ctx);
        }
        tracing::info!(
            correlation_id = %ctx.correlation_id,
            scenario = %scenario.name,
            overall_score = result.resilience.overall_score,
            recovered = result.recovery_successful,
            completed = result.completed,
            "Scenario finished"
        );
        result
    }

    fn transition(&self, phase: &mut Phase, next: Phase, ctx: &RunContext) {
        tracing::debug!(
            correlation_id = %ctx.correlation_id,
            from = %phase,
            to = %next,
            "Phase transition"
        );
        *phase = next;
    }

    /// Validate targets and apply the scenario's failure.
    async fn inject(
        &self,
        scenario: &ChaosScenario,
        ctx: &RunContext,
    ) -> Result<InjectedState, InjectionError> {
        for target in &scenario.targets {
            if !self.registry.contains_key(target) {
                return Err(InjectionError::TargetNotFound {
                    name: target.clone(),
                });
            }
        }

        tracing::info!(
            correlation_id = %ctx.correlation_id,
            scenario = %scenario.name,
            kind = %scenario.kind,
            targets = ?scenario.targets,
            "Injecting failure"
        );

        match scenario.kind {
            ScenarioKind::NetworkPartition => self.inject_partition(scenario, ctx).await,
            ScenarioKind::ResourceExhaustion => self.inject_exhaustion(scenario, ctx).await,
            ScenarioKind::ServiceFailure => self.inject_service_failure(scenario, ctx).await,
        }
    }

    /// Move the targets onto a freshly created isolated network.
    async fn inject_partition(
        &self,
        scenario: &ChaosScenario,
        ctx: &RunContext,
    ) -> Result<InjectedState, InjectionError> {
        let isolated_network = format!("{}-isolated", self.network_name);
        self.orchestrator.create_network(&isolated_network).await?;

        let mut moved = Vec::new();
        for target in &scenario.targets {
            let result: Result<(), InjectionError> = async {
                self.orchestrator
                    .disconnect_network(&self.network_name, target)
                    .await?;
                self.orchestrator
                    .connect_network(&isolated_network, target)
                    .await?;
                Ok(())
            }
            .await;

            if let Err(e) = result {
                // Put already-moved targets back and do not leave the
                // partition network behind on a failed injection.
                self.heal_partition(&isolated_network, &moved, ctx).await;
                return Err(e);
            }
            moved.push(target.clone());
        }

        Ok(InjectedState::NetworkPartition {
            isolated_network,
            targets: moved,
        })
    }

    /// Constrain the targets' memory and CPU, remembering the original
    /// limits for the heal.
    async fn inject_exhaustion(
        &self,
        scenario: &ChaosScenario,
        ctx: &RunContext,
    ) -> Result<InjectedState, InjectionError> {
        let fraction = (scenario.failure_percent / 100.0).clamp(0.01, 1.0);
        let mut original = Vec::new();

        for target in &scenario.targets {
            let applied: Result<ResourceLimits, InjectionError> = async {
                let state = self.orchestrator.inspect_container(target).await?;

                let memory_base =
                    state.limits.memory_bytes.unwrap_or(EXHAUSTION_BASE_MEMORY_BYTES);
                let cpu_base = state.limits.nano_cpus.unwrap_or(EXHAUSTION_BASE_NANO_CPUS);
                let constrained = ResourceLimits {
                    memory_bytes: Some((memory_base as f64 * fraction) as i64),
                    nano_cpus: Some((cpu_base as f64 * fraction) as i64),
                };

                self.orchestrator
                    .update_resources(target, &constrained)
                    .await?;
                Ok(state.limits)
            }
            .await;

            match applied {
                Ok(limits) => original.push((target.clone(), limits)),
                Err(e) => {
                    // Lift the caps already applied before reporting the
                    // failed injection, so nothing stays constrained.
                    self.restore_limits(&original, ctx).await;
                    return Err(e);
                }
            }
        }

        Ok(InjectedState::ResourceExhaustion { original })
    }

    /// Stop the target containers outright.
    async fn inject_service_failure(
        &self,
        scenario: &ChaosScenario,
        ctx: &RunContext,
    ) -> Result<InjectedState, InjectionError> {
        let mut stopped = Vec::new();
        for target in &scenario.targets {
            if let Err(e) = self.orchestrator.stop_container(target).await {
                // Restart whatever was already stopped; a failed injection
                // skips the heal so this is the only chance to revert.
                self.restart_stopped(&stopped, ctx).await;
                return Err(e.into());
            }
            if let Some(mut entry) = self.registry.get_mut(target) {
                entry.healthy = false;
            }
            stopped.push(target.clone());
        }
        Ok(InjectedState::ServiceFailure { stopped })
    }

    /// Reverse exactly what the injection applied. Per-component failures
    /// are logged and never stop the remaining heals.
    async fn heal(&self, state: &InjectedState, ctx: &RunContext) {
        match state {
            InjectedState::NetworkPartition {
                isolated_network,
                targets,
            } => self.heal_partition(isolated_network, targets, ctx).await,
            InjectedState::ResourceExhaustion { original } => {
                self.restore_limits(original, ctx).await
            }
            InjectedState::ServiceFailure { stopped } => self.restart_stopped(stopped, ctx).await,
        }
    }

    /// Reconnect the recorded targets to the shared network, then drop the
    /// partition network. Works from the list captured at injection so one
    /// component's failure never blocks reconnecting the others.
    async fn heal_partition(&self, isolated_network: &str, targets: &[String], ctx: &RunContext) {
        for target in targets {
            if let Err(e) = self
                .orchestrator
                .disconnect_network(isolated_network, target)
                .await
            {
                self.log_heal_error(ctx, target, &e.to_string());
            }
            if let Err(e) = self
                .orchestrator
                .connect_network(&self.network_name, target)
                .await
            {
                self.log_heal_error(ctx, target, &e.to_string());
            }
        }
        if let Err(e) = self.orchestrator.remove_network(isolated_network).await {
            self.log_heal_error(ctx, isolated_network, &e.to_string());
        }
    }

    async fn restore_limits(&self, applied: &[(String, ResourceLimits)], ctx: &RunContext) {
        for (target, limits) in applied {
            if let Err(e) = self.orchestrator.update_resources(target, limits).await {
                self.log_heal_error(ctx, target, &e.to_string());
            }
        }
    }

    async fn restart_stopped(&self, stopped: &[String], ctx: &RunContext) {
        for target in stopped {
            if let Err(e) = self.orchestrator.start_container(target).await {
                self.log_heal_error(ctx, target, &e.to_string());
            }
        }
    }

    fn log_heal_error(&self, ctx: &RunContext, component: &str, reason: &str) {
        let error = HealError {
            component: component.to_string(),
            reason: reason.to_string(),
        };
        tracing::error!(correlation_id = %ctx.correlation_id, %error, "Heal step failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::MockOrchestrator;
    use crate::probe::MockProbe;
    use crate::provision::InfrastructureProvisioner;
    use faultline_types::{ComponentKind, ComponentSpec, InfrastructureSpec};

    struct Harness {
        mock: MockOrchestrator,
        probe: MockProbe,
        executor: ScenarioExecutor,
        network: String,
        _dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let mock = MockOrchestrator::new();
        let probe = MockProbe::new();
        let mut config = EngineConfig::default();
        config.timing.monitor_interval_secs = 5;
        config.timing.recovery_poll_interval_secs = 1;

        let provisioner = InfrastructureProvisioner::new(
            Arc::new(mock.clone()),
            Arc::new(probe.clone()),
            &config,
        );
        let spec = InfrastructureSpec::new(vec![ComponentSpec::new(
            "broker",
            ComponentKind::Broker,
            "img",
            "broker:9092",
        )])
        .with_workload(
            ComponentSpec::new("workload-{n}", ComponentKind::Workload, "img", "workload-{n}:80"),
            2,
        );
        let ctx = RunContext::new("setup");
        let registry = provisioner.provision(&spec, &ctx).await.unwrap();
        let network = provisioner.network_name().to_string();

        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCollector::new(
            Arc::new(mock.clone()),
            Arc::clone(&registry),
            &network,
            &config.timing,
            dir.path(),
        );
        let executor = ScenarioExecutor::new(
            Arc::new(mock.clone()),
            Arc::new(probe.clone()),
            registry,
            &network,
            config,
            evidence,
        );
        Harness {
            mock,
            probe,
            executor,
            network,
            _dir: dir,
        }
    }

    fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test(start_paused = true)]
    async fn partition_moves_targets_and_heals() {
        let h = harness().await;
        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("part", ScenarioKind::NetworkPartition)
            .targets(&["workload-1"])
            .duration_secs(10)
            .recovery_time_limit_secs(20);

        let ctx = RunContext::new("part");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(result.failure_injection_successful);
        assert!(result.completed);
        assert!(result.recovery_successful);
        // Back on the shared network, isolated network gone.
        assert_eq!(h.mock.networks_of("workload-1"), vec![h.network.clone()]);
        assert!(!h.mock.network_exists(&format!("{}-isolated", h.network)));
        assert!(!result.samples.is_empty());
        // All probes kept answering during the mock partition.
        assert!((result.resilience.availability_score - 1.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn service_failure_stops_and_restarts_only_targets() {
        let h = harness().await;
        for (name, endpoint) in [
            ("broker", "broker:9092"),
            ("workload-1", "workload-1:80"),
            ("workload-2", "workload-2:80"),
        ] {
            let url = format!("http://{endpoint}/health");
            h.probe.link_container(&url, &h.mock, name);
        }

        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("svc", ScenarioKind::ServiceFailure)
            .targets(&["workload-1"])
            .duration_secs(10)
            .recovery_time_limit_secs(20);

        let ctx = RunContext::new("svc");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert_eq!(h.mock.count_calls("stop_container workload-1"), 1);
        assert_eq!(h.mock.count_calls("start_container workload-1"), 1);
        assert_eq!(h.mock.count_calls("stop_container workload-2"), 0);
        assert_eq!(h.mock.container_running("workload-1"), Some(true));
        assert!(result.recovery_successful);
        // One of three components was down during the window.
        assert!(result.resilience.availability_score < 1.0);
        assert!(result.resilience.availability_score > 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_constrains_and_restores_limits() {
        let h = harness().await;
        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("mem", ScenarioKind::ResourceExhaustion)
            .targets(&["workload-1", "workload-2"])
            .failure_percent(25.0)
            .duration_secs(10)
            .recovery_time_limit_secs(20);

        let ctx = RunContext::new("mem");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(result.failure_injection_successful);
        assert_eq!(h.mock.count_calls("update_resources"), 4);
        // Limits restored to the unlimited originals.
        assert_eq!(
            h.mock.limits_of("workload-1"),
            Some(ResourceLimits::unlimited())
        );
        assert_eq!(
            h.mock.limits_of("workload-2"),
            Some(ResourceLimits::unlimited())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_target_yields_degraded_result_without_heal() {
        let h = harness().await;
        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("bad", ScenarioKind::ServiceFailure)
            .targets(&["ghost"])
            .duration_secs(10);

        let ctx = RunContext::new("bad");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(!result.failure_injection_successful);
        assert!(!result.completed);
        assert!(result.samples.is_empty());
        assert_eq!(result.resilience.total_samples, 0);
        assert_eq!(h.mock.count_calls("stop_container"), 0);
        assert_eq!(h.mock.count_calls("start_container"), 0);
        // Snapshots and evidence still collected.
        assert!(result.before.is_some());
        assert!(result.after.is_some());
        assert!(!result.evidence_artifacts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_injection_mid_partition_reverts_moved_targets() {
        let h = harness().await;
        // First target moves; the second target's disconnect fails.
        h.mock.fail_after("disconnect_network", 1, "daemon busy");

        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("part", ScenarioKind::NetworkPartition)
            .targets(&["workload-1", "workload-2"])
            .duration_secs(10);

        let ctx = RunContext::new("part");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(!result.failure_injection_successful);
        assert!(!h.mock.network_exists(&format!("{}-isolated", h.network)));
        assert_eq!(h.mock.networks_of("workload-1"), vec![h.network.clone()]);
        assert_eq!(h.mock.networks_of("workload-2"), vec![h.network.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn partition_heal_reconnects_each_target_independently() {
        let h = harness().await;
        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("part", ScenarioKind::NetworkPartition)
            .targets(&["workload-1", "workload-2"])
            .duration_secs(10)
            .recovery_time_limit_secs(20);

        // Injection disconnects each target once; the third disconnect is
        // the heal's first, and its failure must not strand the second
        // target or skip the reconnects.
        h.mock.fail_after("disconnect_network", 2, "daemon busy");

        let ctx = RunContext::new("part");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(result.failure_injection_successful);
        assert!(result.recovery_successful);
        assert_eq!(h.mock.networks_of("workload-1"), vec![h.network.clone()]);
        assert_eq!(h.mock.networks_of("workload-2"), vec![h.network.clone()]);
        assert!(!h.mock.network_exists(&format!("{}-isolated", h.network)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_injection_mid_exhaustion_lifts_applied_caps() {
        let h = harness().await;
        // First target gets constrained; the second target's update fails.
        h.mock.fail_after("update_resources", 1, "daemon busy");

        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("mem", ScenarioKind::ResourceExhaustion)
            .targets(&["workload-1", "workload-2"])
            .failure_percent(25.0)
            .duration_secs(10);

        let ctx = RunContext::new("mem");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(!result.failure_injection_successful);
        assert!(result.samples.is_empty());
        // Apply, failed apply, restore.
        assert_eq!(h.mock.count_calls("update_resources"), 3);
        assert_eq!(
            h.mock.limits_of("workload-1"),
            Some(ResourceLimits::unlimited())
        );
        assert_eq!(
            h.mock.limits_of("workload-2"),
            Some(ResourceLimits::unlimited())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_injection_mid_service_failure_restarts_stopped() {
        let h = harness().await;
        // First target stops; the second target's stop fails.
        h.mock.fail_after("stop_container", 1, "daemon busy");

        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("svc", ScenarioKind::ServiceFailure)
            .targets(&["workload-1", "workload-2"])
            .duration_secs(10);

        let ctx = RunContext::new("svc");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert!(!result.failure_injection_successful);
        assert_eq!(h.mock.count_calls("start_container workload-1"), 1);
        assert_eq!(h.mock.container_running("workload-1"), Some(true));
        assert_eq!(h.mock.container_running("workload-2"), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn heal_error_does_not_stop_remaining_heals() {
        let h = harness().await;
        let (_tx, cancel) = cancel_channel();
        let scenario = ChaosScenario::new("svc", ScenarioKind::ServiceFailure)
            .targets(&["workload-1", "workload-2"])
            .duration_secs(10)
            .recovery_time_limit_secs(10);

        // First restart fails; the second target must still be healed.
        h.mock.fail_next("start_container", "daemon busy");

        let ctx = RunContext::new("svc");
        let result = h.executor.execute(&scenario, cancel, &ctx).await;

        assert_eq!(h.mock.count_calls("start_container"), 2);
        assert_eq!(h.mock.container_running("workload-1"), Some(false));
        assert_eq!(h.mock.container_running("workload-2"), Some(true));
        assert!(result.failure_injection_successful);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_heals_and_marks_incomplete() {
        let h = harness().await;
        let (tx, cancel) = watch::channel(false);
        let scenario = ChaosScenario::new("long", ScenarioKind::ServiceFailure)
            .targets(&["workload-1"])
            .duration_secs(3600)
            .recovery_time_limit_secs(20);

        let ctx = RunContext::new("long");
        let executor = h.executor;
        let handle =
            tokio::spawn(async move { executor.execute(&scenario, cancel, &ctx).await });

        tokio::time::sleep(std::time::Duration::from_secs(12)).await;
        tx.send(true).unwrap();
        let result = handle.await.unwrap();

        assert!(!result.completed);
        assert!(result.failure_injection_successful);
        // Healed despite cancellation.
        assert_eq!(h.mock.count_calls("start_container workload-1"), 1);
        assert_eq!(h.mock.container_running("workload-1"), Some(true));
        assert!(!result.samples.is_empty());
    }
}
