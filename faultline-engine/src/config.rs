//! Configuration loading for the faultline engine.
//!
//! Configuration is loaded from a TOML file (default: `faultline.toml`).
//! Polling intervals, timeouts, and the scoring calibration constants are
//! all named, overridable values rather than hard-coded numbers.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Polling and timing configuration.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Resilience scoring calibration.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Infrastructure defaults.
    #[serde(default)]
    pub infra: InfraConfig,
}

/// Polling and timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Interval between provisioning health polls in seconds (default: 2).
    #[serde(default = "default_health_poll_interval")]
    pub health_poll_interval_secs: u64,
    /// Interval between behavior monitor ticks in seconds (default: 5).
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
    /// Interval between recovery polls in seconds (default: 2).
    #[serde(default = "default_recovery_poll_interval")]
    pub recovery_poll_interval_secs: u64,
    /// Per-probe HTTP timeout in milliseconds (default: 3000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Number of log lines collected per component as evidence (default: 200).
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

/// Resilience scoring calibration.
///
/// The thresholds and weights are heuristic calibrations; they are
/// preserved as configuration rather than re-derived.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Response time (seconds) at which the performance score reaches 0
    /// (default: 5.0).
    #[serde(default = "default_response_time_threshold")]
    pub response_time_threshold_secs: f64,
    /// Recovery time (seconds) at which the recovery score reaches 0
    /// (default: 60.0).
    #[serde(default = "default_recovery_time_threshold")]
    pub recovery_time_threshold_secs: f64,
    /// Minimum total sample count for medium confidence (default: 30).
    #[serde(default = "default_min_samples")]
    pub min_samples_for_confidence: usize,
    /// Weight of the availability score in the overall score (default: 0.35).
    #[serde(default = "default_availability_weight")]
    pub availability_weight: f64,
    /// Weight of the error-tolerance score (default: 0.25).
    #[serde(default = "default_error_tolerance_weight")]
    pub error_tolerance_weight: f64,
    /// Weight of the performance score (default: 0.25).
    #[serde(default = "default_performance_weight")]
    pub performance_weight: f64,
    /// Weight of the recovery score (default: 0.15).
    #[serde(default = "default_recovery_weight")]
    pub recovery_weight: f64,
}

/// Infrastructure defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct InfraConfig {
    /// Prefix for the isolated networks the engine creates (default: "faultline").
    #[serde(default = "default_network_prefix")]
    pub network_prefix: String,
    /// Default number of workload instances when the topology spec does not
    /// say otherwise (default: 2).
    #[serde(default = "default_workload_instances")]
    pub workload_instances: u32,
}

// Default value functions
fn default_health_poll_interval() -> u64 {
    2
}

fn default_monitor_interval() -> u64 {
    5
}

fn default_recovery_poll_interval() -> u64 {
    2
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_log_tail_lines() -> usize {
    200
}

fn default_response_time_threshold() -> f64 {
    5.0
}

fn default_recovery_time_threshold() -> f64 {
    60.0
}

fn default_min_samples() -> usize {
    30
}

fn default_availability_weight() -> f64 {
    0.35
}

fn default_error_tolerance_weight() -> f64 {
    0.25
}

fn default_performance_weight() -> f64 {
    0.25
}

fn default_recovery_weight() -> f64 {
    0.15
}

fn default_network_prefix() -> String {
    "faultline".to_string()
}

fn default_workload_instances() -> u32 {
    2
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            health_poll_interval_secs: default_health_poll_interval(),
            monitor_interval_secs: default_monitor_interval(),
            recovery_poll_interval_secs: default_recovery_poll_interval(),
            probe_timeout_ms: default_probe_timeout_ms(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            response_time_threshold_secs: default_response_time_threshold(),
            recovery_time_threshold_secs: default_recovery_time_threshold(),
            min_samples_for_confidence: default_min_samples(),
            availability_weight: default_availability_weight(),
            error_tolerance_weight: default_error_tolerance_weight(),
            performance_weight: default_performance_weight(),
            recovery_weight: default_recovery_weight(),
        }
    }
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            network_prefix: default_network_prefix(),
            workload_instances: default_workload_instances(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            scoring: ScoringConfig::default(),
            infra: InfraConfig::default(),
        }
    }
}

impl TimingConfig {
    /// Health poll interval as a [`Duration`].
    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_interval_secs)
    }

    /// Monitor tick interval as a [`Duration`].
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Recovery poll interval as a [`Duration`].
    pub fn recovery_poll_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_poll_interval_secs)
    }

    /// Per-probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl ScoringConfig {
    /// Sum of the four dimension weights.
    pub fn weight_sum(&self) -> f64 {
        self.availability_weight
            + self.error_tolerance_weight
            + self.performance_weight
            + self.recovery_weight
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// scoring weights do not sum to 1.0.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: EngineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeights`] if the scoring weights do not
    /// sum to exactly 1.0 (within float tolerance).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.scoring.weight_sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Scoring weights do not sum to 1.0.
    #[error("scoring weights must sum to 1.0, got {sum}")]
    InvalidWeights {
        /// The actual weight sum.
        sum: f64,
    },
}
