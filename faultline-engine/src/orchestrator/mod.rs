//! Container-orchestrator capability interface.
//!
//! The engine never talks to a container runtime directly; it goes through
//! the [`ContainerOrchestrator`] trait. The production implementation is
//! [`DockerOrchestrator`] (bollard); tests use [`MockOrchestrator`], which
//! records every call and serves scripted state.

mod docker;
mod mock;

pub use docker::DockerOrchestrator;
pub use mock::MockOrchestrator;

use crate::error::OrchestratorResult;
use async_trait::async_trait;
use faultline_types::ResourceStats;

/// Resource limits applied to a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceLimits {
    /// Memory limit in bytes (None = unchanged/unlimited).
    pub memory_bytes: Option<i64>,
    /// CPU limit in units of 1e-9 CPUs (None = unchanged/unlimited).
    pub nano_cpus: Option<i64>,
}

impl ResourceLimits {
    /// No limits.
    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// Configuration for launching a container.
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    /// Image to run.
    pub image: String,
    /// Environment variables (`KEY=value` form).
    pub env: Vec<String>,
    /// Network to attach the container to at start.
    pub network: Option<String>,
    /// Initial resource limits.
    pub limits: ResourceLimits,
}

/// Result of executing a command inside a container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i64,
}

impl ExecOutput {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Inspected state of a container.
#[derive(Debug, Clone)]
pub struct ContainerState {
    /// Container id.
    pub id: String,
    /// Status string (`running`, `exited`, ...).
    pub status: String,
    /// Whether the container is currently running.
    pub running: bool,
    /// Published ports.
    pub ports: Vec<String>,
    /// Networks the container is attached to.
    pub networks: Vec<String>,
    /// Currently configured resource limits.
    pub limits: ResourceLimits,
}

/// Inspected state of a network.
#[derive(Debug, Clone)]
pub struct NetworkState {
    /// Network id.
    pub id: String,
    /// Network driver.
    pub driver: String,
    /// Names of attached containers.
    pub members: Vec<String>,
}

/// Capability interface over the container runtime.
///
/// All operations address containers and networks by name. Implementations
/// must be safe to share across tasks.
#[async_trait]
pub trait ContainerOrchestrator: Send + Sync {
    /// Create a network and return its id.
    async fn create_network(&self, name: &str) -> OrchestratorResult<String>;

    /// Remove a network.
    async fn remove_network(&self, name: &str) -> OrchestratorResult<()>;

    /// Create and start a container, returning its id.
    async fn run_container(&self, name: &str, config: &ContainerConfig)
        -> OrchestratorResult<String>;

    /// Stop a container.
    async fn stop_container(&self, name: &str) -> OrchestratorResult<()>;

    /// Start a stopped container.
    async fn start_container(&self, name: &str) -> OrchestratorResult<()>;

    /// Remove a container (force, with volumes).
    async fn remove_container(&self, name: &str) -> OrchestratorResult<()>;

    /// Attach a container to a network.
    async fn connect_network(&self, network: &str, container: &str) -> OrchestratorResult<()>;

    /// Detach a container from a network.
    async fn disconnect_network(&self, network: &str, container: &str) -> OrchestratorResult<()>;

    /// Update a container's resource limits.
    async fn update_resources(
        &self,
        container: &str,
        limits: &ResourceLimits,
    ) -> OrchestratorResult<()>;

    /// Execute a command inside a container.
    async fn exec(&self, container: &str, cmd: &[&str]) -> OrchestratorResult<ExecOutput>;

    /// Collect up to `tail` log lines from a container.
    async fn logs(
        &self,
        container: &str,
        tail: usize,
        timestamps: bool,
    ) -> OrchestratorResult<String>;

    /// Collect a one-shot resource usage reading.
    async fn stats(&self, container: &str) -> OrchestratorResult<ResourceStats>;

    /// Inspect a container.
    async fn inspect_container(&self, container: &str) -> OrchestratorResult<ContainerState>;

    /// Inspect a network.
    async fn inspect_network(&self, network: &str) -> OrchestratorResult<NetworkState>;
}
