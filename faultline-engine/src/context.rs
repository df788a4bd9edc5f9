//! Execution context threaded through one scenario run.
//!
//! The correlation id travels as an explicit parameter and tracing field,
//! never through global logger state.

use faultline_types::CorrelationId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Context for one scenario execution.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Correlation id for this execution.
    pub correlation_id: CorrelationId,
    /// Name of the scenario being executed.
    pub scenario_name: String,
}

impl RunContext {
    /// Create a context with a fresh correlation id.
    pub fn new(scenario_name: &str) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            scenario_name: scenario_name.into(),
        }
    }
}

/// Current unix time in milliseconds.
pub fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current unix time in seconds.
pub fn unix_secs() -> u64 {
    unix_ms() / 1000
}
