//! Error types for the faultline engine.
//!
//! Propagation policy: only [`ProvisionError`] (and configuration errors)
//! surface to the caller before any result exists. Injection, monitoring,
//! healing, and evidence errors degrade gracefully into the
//! [`ChaosTestResult`](faultline_types::ChaosTestResult) so batch execution
//! is never halted by one failing scenario. Exceeding the recovery timeout
//! is a result field, not an error.

/// Errors from the container-orchestrator backend.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Underlying backend call failed.
    #[error("orchestrator backend error: {0}")]
    Backend(String),

    /// The named container does not exist.
    #[error("container not found: {name}")]
    ContainerNotFound {
        /// The container name that was not found.
        name: String,
    },

    /// The named network does not exist.
    #[error("network not found: {name}")]
    NetworkNotFound {
        /// The network name that was not found.
        name: String,
    },

    /// Command execution inside a container failed.
    #[error("exec failed in {container}: exit={exit_code}")]
    ExecFailed {
        /// Container the command ran in.
        container: String,
        /// Exit code from the command.
        exit_code: i64,
    },
}

impl From<bollard::errors::Error> for OrchestratorError {
    fn from(e: bollard::errors::Error) -> Self {
        OrchestratorError::Backend(e.to_string())
    }
}

/// Errors from the HTTP probe client.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Request failed before a response was received.
    #[error("probe request failed: {0}")]
    Request(String),

    /// Request did not complete within the timeout.
    #[error("probe timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },
}

/// Fatal pre-injection failure: required infrastructure never came up.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A required component never reported healthy within its startup window.
    #[error("component {name} not healthy after {waited_secs}s")]
    ComponentNeverHealthy {
        /// The component that failed its health wait.
        name: String,
        /// How long the provisioner waited.
        waited_secs: u64,
    },

    /// Orchestrator call failed while setting up the topology.
    #[error("provisioning failed: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

/// Non-fatal injection failure: produces a degraded result, heal is skipped.
#[derive(Debug, thiserror::Error)]
pub enum InjectionError {
    /// A target named by the scenario is not in the component registry.
    #[error("injection target not found: {name}")]
    TargetNotFound {
        /// The missing target name.
        name: String,
    },

    /// Orchestrator call failed during injection.
    #[error("injection failed: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

/// One monitor tick failed; logged, sample recorded as partial, loop continues.
#[derive(Debug, thiserror::Error)]
#[error("monitor tick failed: {reason}")]
pub struct MonitorError {
    /// What went wrong during the tick.
    pub reason: String,
}

/// One component's heal failed; logged, remaining components still healed.
#[derive(Debug, thiserror::Error)]
#[error("heal failed for {component}: {reason}")]
pub struct HealError {
    /// The component whose heal failed.
    pub component: String,
    /// What went wrong.
    pub reason: String,
}

/// One evidence artifact could not be collected; recorded as a placeholder.
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// Filesystem write failed.
    #[error("evidence write failed for {artifact}: {source}")]
    Write {
        /// Artifact identifier.
        artifact: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing an artifact document failed.
    #[error("evidence serialization failed for {artifact}: {source}")]
    Serialize {
        /// Artifact identifier.
        artifact: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// Orchestrator call failed while gathering artifact data.
    #[error("evidence collection failed for {artifact}: {source}")]
    Orchestrator {
        /// Artifact identifier.
        artifact: String,
        /// Underlying orchestrator error.
        source: OrchestratorError,
    },
}

/// Umbrella error for engine entry points.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Provisioning error.
    #[error("provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// Orchestrator error outside a scenario execution (e.g. teardown setup).
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

/// Result alias for engine entry points.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result alias for orchestrator operations.
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
