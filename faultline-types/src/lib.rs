//! # faultline-types
//!
//! Data model for the faultline chaos-engineering engine.
//!
//! This crate provides the foundational types shared across faultline crates:
//! - [`ChaosScenario`] / [`ScenarioKind`] - fault-injection experiment definitions
//! - [`ComponentSpec`] / [`InfrastructureComponent`] - managed units under test
//! - [`BehaviorSample`] - timestamped observations taken during monitoring
//! - [`StatisticalMetrics`] / [`ResilienceMetrics`] - measurement outputs
//! - [`ChaosTestResult`] - the per-execution result record
//! - [`CorrelationId`] - identifier threaded through one scenario execution

#![warn(missing_docs)]
#![warn(clippy::all)]

mod component;
mod ids;
mod metrics;
mod result;
mod sample;
mod scenario;
mod snapshot;

pub use component::{ComponentKind, ComponentSpec, InfrastructureComponent, InfrastructureSpec};
pub use ids::CorrelationId;
pub use metrics::{ConfidenceLevel, ResilienceMetrics, StatisticalMetrics};
pub use result::ChaosTestResult;
pub use sample::{BehaviorSample, ConnectivityEntry, ProbeResult, ResourceStats};
pub use scenario::{ChaosScenario, ScenarioKind};
pub use snapshot::{ComponentSnapshot, HostMetrics, InfraSnapshot, NetworkSnapshot};
