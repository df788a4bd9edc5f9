//! Chaos engineering orchestration and measurement engine.
//!
//! Provisions an isolated containerized topology, injects a declared
//! failure, monitors system behavior while the failure is active, heals,
//! verifies recovery, and turns the observations into a statistically
//! grounded resilience measurement with persisted evidence.
//!
//! The entry point is [`ChaosEngine`]; scenarios and result types live in
//! the `faultline-types` crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod executor;
pub mod monitor;
pub mod orchestrator;
pub mod probe;
pub mod provision;
pub mod recovery;

pub use analyzer::ResilienceAnalyzer;
pub use config::{EngineConfig, InfraConfig, ScoringConfig, TimingConfig};
pub use context::RunContext;
pub use engine::{CancelHandle, ChaosEngine};
pub use error::{EngineError, Result};
pub use evidence::EvidenceCollector;
pub use executor::ScenarioExecutor;
pub use monitor::BehaviorMonitor;
pub use orchestrator::{ContainerOrchestrator, DockerOrchestrator, MockOrchestrator};
pub use probe::{HttpProbe, MockProbe, ReqwestProbe};
pub use provision::{ComponentRegistry, InfrastructureProvisioner};
pub use recovery::{RecoveryOutcome, RecoveryWaiter};
