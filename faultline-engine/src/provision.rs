//! Infrastructure provisioner.
//!
//! Creates an isolated network, launches the required components and
//! workload instances, and waits for each to report healthy. A required
//! component that never becomes healthy is the engine's one fatal
//! pre-injection failure mode.

use crate::config::{EngineConfig, InfraConfig, TimingConfig};
use crate::context::RunContext;
use crate::error::ProvisionError;
use crate::orchestrator::{ContainerConfig, ContainerOrchestrator, ResourceLimits};
use crate::probe::HttpProbe;
use dashmap::DashMap;
use faultline_types::{ComponentSpec, InfrastructureComponent, InfrastructureSpec};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Shared name → component registry.
///
/// Populated once at provisioning, read-mostly afterwards. Health-flag
/// writes go through dashmap entries, which serializes concurrent writers
/// per component.
pub type ComponentRegistry = Arc<DashMap<String, InfrastructureComponent>>;

#[derive(Debug, Default)]
struct ProvisionedState {
    network: Option<String>,
    containers: Vec<String>,
}

/// Provisions and tears down the isolated test infrastructure.
pub struct InfrastructureProvisioner {
    orchestrator: Arc<dyn ContainerOrchestrator>,
    probe: Arc<dyn HttpProbe>,
    timing: TimingConfig,
    infra: InfraConfig,
    network_name: String,
    registry: ComponentRegistry,
    state: Mutex<ProvisionedState>,
}

impl InfrastructureProvisioner {
    /// Create a provisioner. The isolated network name gets a unique suffix
    /// so concurrent engines never collide.
    pub fn new(
        orchestrator: Arc<dyn ContainerOrchestrator>,
        probe: Arc<dyn HttpProbe>,
        config: &EngineConfig,
    ) -> Self {
        let network_name = format!(
            "{}-{}",
            config.infra.network_prefix,
            &uuid::Uuid::new_v4().as_simple().to_string()[..12]
        );
        Self {
            orchestrator,
            probe,
            timing: config.timing.clone(),
            infra: config.infra.clone(),
            network_name,
            registry: Arc::new(DashMap::new()),
            state: Mutex::new(ProvisionedState::default()),
        }
    }

    /// Name of the shared isolated network.
    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    /// The component registry (empty until [`provision`](Self::provision)).
    pub fn registry(&self) -> ComponentRegistry {
        Arc::clone(&self.registry)
    }

    /// Create the network, launch every component and workload instance,
    /// and wait for health.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] if any orchestrator call fails or any
    /// component never reports healthy within its startup window. The
    /// partially provisioned infrastructure is left for
    /// [`teardown`](Self::teardown).
    pub async fn provision(
        &self,
        spec: &InfrastructureSpec,
        ctx: &RunContext,
    ) -> Result<ComponentRegistry, ProvisionError> {
        let mut spec = spec.clone();
        if spec.workload.is_some() && spec.workload_instances == 0 {
            spec.workload_instances = self.infra.workload_instances;
        }
        let components = spec.expand();

        tracing::info!(
            correlation_id = %ctx.correlation_id,
            network = %self.network_name,
            components = components.len(),
            "Provisioning infrastructure"
        );

        self.orchestrator.create_network(&self.network_name).await?;
        self.state.lock().unwrap().network = Some(self.network_name.clone());

        for component in &components {
            self.launch(component, ctx).await?;
        }

        for component in &components {
            self.wait_healthy(component, ctx).await?;
        }

        Ok(self.registry())
    }

    async fn launch(&self, spec: &ComponentSpec, ctx: &RunContext) -> Result<(), ProvisionError> {
        let config = ContainerConfig {
            image: spec.image.clone(),
            env: spec.env.clone(),
            network: Some(self.network_name.clone()),
            limits: ResourceLimits::unlimited(),
        };

        let container_id = self.orchestrator.run_container(&spec.name, &config).await?;
        self.state.lock().unwrap().containers.push(spec.name.clone());

        tracing::debug!(
            correlation_id = %ctx.correlation_id,
            component = %spec.name,
            container_id = %container_id,
            "Component launched"
        );

        self.registry.insert(
            spec.name.clone(),
            InfrastructureComponent {
                name: spec.name.clone(),
                kind: spec.kind,
                container_id,
                endpoint: spec.endpoint.clone(),
                health_url: spec.health_url(),
                startup_secs: 0.0,
                healthy: false,
            },
        );
        Ok(())
    }

    /// Poll the component's health endpoint every `health_poll_interval`
    /// until it answers 2xx or the startup window elapses.
    async fn wait_healthy(
        &self,
        spec: &ComponentSpec,
        ctx: &RunContext,
    ) -> Result<(), ProvisionError> {
        let url = spec.health_url();
        let started = Instant::now();
        let deadline = started + spec.startup_timeout();

        loop {
            let healthy = match self.probe.get(&url, self.timing.probe_timeout()).await {
                Ok(response) => response.is_success(),
                Err(_) => false,
            };

            if healthy {
                let startup_secs = started.elapsed().as_secs_f64();
                if let Some(mut entry) = self.registry.get_mut(&spec.name) {
                    entry.healthy = true;
                    entry.startup_secs = startup_secs;
                }
                tracing::info!(
                    correlation_id = %ctx.correlation_id,
                    component = %spec.name,
                    startup_secs,
                    "Component healthy"
                );
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(ProvisionError::ComponentNeverHealthy {
                    name: spec.name.clone(),
                    waited_secs: spec.startup_timeout_secs,
                });
            }

            tokio::time::sleep(self.timing.health_poll_interval()).await;
        }
    }

    /// Tear down everything this provisioner created, best effort.
    ///
    /// Individual removal failures are collected and logged but never stop
    /// the remaining cleanup. Idempotent: a second call finds nothing left
    /// to remove and does not re-attempt anything.
    pub async fn teardown(&self) -> Vec<String> {
        let state = {
            let mut guard = self.state.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        let mut failures = Vec::new();

        for name in &state.containers {
            if let Err(e) = self.orchestrator.stop_container(name).await {
                failures.push(format!("stop {name}: {e}"));
            }
            if let Err(e) = self.orchestrator.remove_container(name).await {
                failures.push(format!("remove {name}: {e}"));
            }
        }

        if let Some(network) = &state.network {
            if let Err(e) = self.orchestrator.remove_network(network).await {
                failures.push(format!("remove network {network}: {e}"));
            }
        }

        self.registry.clear();

        if failures.is_empty() {
            tracing::info!("Teardown complete");
        } else {
            for failure in &failures {
                tracing::warn!(%failure, "Teardown step failed");
            }
        }
        failures
    }
}
