//! Engine façade.
//!
//! [`ChaosEngine`] owns the configuration and backends and drives the full
//! lifecycle for one or more scenarios: provision, execute each scenario,
//! tear down. A batch is never halted by one failing scenario; every
//! execution contributes a result.

use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::error::Result;
use crate::evidence::EvidenceCollector;
use crate::executor::ScenarioExecutor;
use crate::orchestrator::{ContainerOrchestrator, DockerOrchestrator};
use crate::probe::{HttpProbe, ReqwestProbe};
use crate::provision::InfrastructureProvisioner;
use faultline_types::{ChaosScenario, ChaosTestResult, InfrastructureSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Handle for requesting cancellation of in-flight executions.
///
/// Cancellation is one-shot and sticky: once requested, the current
/// monitoring window ends early, healing and teardown still run, and any
/// remaining scenarios in the batch are skipped.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Orchestrates the full chaos test lifecycle.
pub struct ChaosEngine {
    config: EngineConfig,
    orchestrator: Arc<dyn ContainerOrchestrator>,
    probe: Arc<dyn HttpProbe>,
    evidence_dir: PathBuf,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl ChaosEngine {
    /// Create an engine over the given backends.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the scoring weights are invalid.
    pub fn new(
        config: EngineConfig,
        orchestrator: Arc<dyn ContainerOrchestrator>,
        probe: Arc<dyn HttpProbe>,
        evidence_dir: &Path,
    ) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = watch::channel(false);
        Ok(Self {
            config,
            orchestrator,
            probe,
            evidence_dir: evidence_dir.to_path_buf(),
            cancel_tx: Arc::new(tx),
            cancel_rx: rx,
        })
    }

    /// Create an engine talking to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the daemon is
    /// unreachable.
    pub fn connect_docker(config: EngineConfig, evidence_dir: &Path) -> Result<Self> {
        let orchestrator = DockerOrchestrator::connect()?;
        Self::new(
            config,
            Arc::new(orchestrator),
            Arc::new(ReqwestProbe::new()),
            evidence_dir,
        )
    }

    /// Handle for cancelling in-flight executions from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Provision the topology, execute one scenario, and tear down.
    ///
    /// # Errors
    ///
    /// Only provisioning can fail; everything after it degrades into the
    /// returned result.
    pub async fn run_scenario(
        &self,
        infra: &InfrastructureSpec,
        scenario: &ChaosScenario,
    ) -> Result<ChaosTestResult> {
        let provisioner = self.provisioner();
        let setup_ctx = RunContext::new(&scenario.name);
        let registry = match provisioner.provision(infra, &setup_ctx).await {
            Ok(registry) => registry,
            Err(e) => {
                provisioner.teardown().await;
                return Err(e.into());
            }
        };

        let ctx = RunContext::new(&scenario.name);
        let result = self
            .executor(&provisioner, registry)
            .execute(scenario, self.cancel_rx.clone(), &ctx)
            .await;

        provisioner.teardown().await;
        Ok(result)
    }

    /// Provision the topology once, execute every scenario against it in
    /// order, and tear down.
    ///
    /// Scenarios whose injection fails still produce (degraded) results;
    /// the batch continues. Cancellation skips the scenarios not yet
    /// started.
    ///
    /// # Errors
    ///
    /// Returns an error only if provisioning fails.
    pub async fn run_scenarios(
        &self,
        infra: &InfrastructureSpec,
        scenarios: &[ChaosScenario],
    ) -> Result<Vec<ChaosTestResult>> {
        let provisioner = self.provisioner();
        let setup_ctx = RunContext::new("batch");
        let registry = match provisioner.provision(infra, &setup_ctx).await {
            Ok(registry) => registry,
            Err(e) => {
                provisioner.teardown().await;
                return Err(e.into());
            }
        };

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            if *self.cancel_rx.borrow() {
                tracing::warn!(
                    scenario = %scenario.name,
                    "Cancellation requested; skipping remaining scenarios"
                );
                break;
            }
            let ctx = RunContext::new(&scenario.name);
            let result = self
                .executor(&provisioner, Arc::clone(&registry))
                .execute(scenario, self.cancel_rx.clone(), &ctx)
                .await;
            results.push(result);
        }

        provisioner.teardown().await;
        Ok(results)
    }

    fn provisioner(&self) -> InfrastructureProvisioner {
        InfrastructureProvisioner::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.probe),
            &self.config,
        )
    }

    fn executor(
        &self,
        provisioner: &InfrastructureProvisioner,
        registry: crate::provision::ComponentRegistry,
    ) -> ScenarioExecutor {
        let evidence = EvidenceCollector::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&registry),
            provisioner.network_name(),
            &self.config.timing,
            &self.evidence_dir,
        );
        ScenarioExecutor::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.probe),
            registry,
            provisioner.network_name(),
            self.config.clone(),
            evidence,
        )
    }
}
