//! Statistical and resilience metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptive statistics for one measurement dimension.
///
/// Recomputed value type: never mutated in place. A dimension with no
/// samples yields the all-zero metrics from [`StatisticalMetrics::empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalMetrics {
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (50th percentile, linear interpolation).
    pub median: f64,
    /// Sample standard deviation (0 if n <= 1).
    pub std_dev: f64,
    /// Minimum observed value.
    pub min: f64,
    /// Maximum observed value.
    pub max: f64,
    /// 95th percentile (linear interpolation).
    pub p95: f64,
    /// 99th percentile (linear interpolation).
    pub p99: f64,
    /// Number of samples the statistics were computed from.
    pub sample_size: usize,
    /// Lower bound of the 95% confidence interval for the mean.
    pub ci_lower: f64,
    /// Upper bound of the 95% confidence interval for the mean.
    pub ci_upper: f64,
}

impl StatisticalMetrics {
    /// All-zero metrics for a dimension with no samples.
    pub fn empty() -> Self {
        Self {
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            p95: 0.0,
            p99: 0.0,
            sample_size: 0,
            ci_lower: 0.0,
            ci_upper: 0.0,
        }
    }
}

/// Qualitative confidence tier for a resilience measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Total samples at least 3x the minimum threshold.
    High,
    /// Total samples at least the minimum threshold.
    Medium,
    /// Too few samples for a confident statement.
    Low,
}

impl ConfidenceLevel {
    /// Numeric confidence associated with the tier.
    pub fn value(&self) -> f64 {
        match self {
            ConfidenceLevel::High => 0.95,
            ConfidenceLevel::Medium => 0.80,
            ConfidenceLevel::Low => 0.60,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        };
        f.write_str(s)
    }
}

/// Full resilience measurement for one scenario execution.
///
/// All normalized scores and the overall score lie in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceMetrics {
    /// Availability statistics (fraction of successful probes per sample).
    pub availability_stats: StatisticalMetrics,
    /// Error-rate statistics (fraction of failed probes per sample).
    pub error_rate_stats: StatisticalMetrics,
    /// Response-time statistics in seconds.
    pub response_time_stats: StatisticalMetrics,
    /// Recovery-time statistics in seconds.
    pub recovery_time_stats: StatisticalMetrics,
    /// Normalized availability score.
    pub availability_score: f64,
    /// Normalized error-tolerance score.
    pub error_tolerance_score: f64,
    /// Normalized performance score.
    pub performance_score: f64,
    /// Normalized recovery score.
    pub recovery_score: f64,
    /// Weighted overall resilience score.
    pub overall_score: f64,
    /// Qualitative confidence tier.
    pub confidence: ConfidenceLevel,
    /// Numeric confidence for the tier.
    pub confidence_value: f64,
    /// Measurement window in seconds.
    pub window_secs: f64,
    /// Total samples across all dimensions.
    pub total_samples: usize,
}

impl ResilienceMetrics {
    /// Metrics for an execution that produced no samples at all.
    pub fn empty() -> Self {
        Self {
            availability_stats: StatisticalMetrics::empty(),
            error_rate_stats: StatisticalMetrics::empty(),
            response_time_stats: StatisticalMetrics::empty(),
            recovery_time_stats: StatisticalMetrics::empty(),
            availability_score: 0.0,
            error_tolerance_score: 0.0,
            performance_score: 0.0,
            recovery_score: 0.0,
            overall_score: 0.0,
            confidence: ConfidenceLevel::Low,
            confidence_value: ConfidenceLevel::Low.value(),
            window_secs: 0.0,
            total_samples: 0,
        }
    }
}
