//! Resilience analyzer.
//!
//! Converts the accumulated behavior samples into per-dimension statistics
//! and a weighted overall score with confidence. Pure computation; all
//! calibration constants come from [`ScoringConfig`].

use crate::config::ScoringConfig;
use faultline_types::{BehaviorSample, ConfidenceLevel, ResilienceMetrics, StatisticalMetrics};

/// Normal-approximation critical value for the 95% CI when n >= 30.
const CRITICAL_LARGE_SAMPLE: f64 = 1.96;
/// Wider critical value used for small samples (n < 30).
const CRITICAL_SMALL_SAMPLE: f64 = 2.576;

/// Compute descriptive statistics over one dimension's samples.
///
/// Percentiles use linear interpolation; the standard deviation is the
/// sample (n-1) form, 0 when n <= 1. Zero samples yield all-zero metrics
/// with a (0, 0) interval.
pub fn compute_stats(values: &[f64]) -> StatisticalMetrics {
    let n = values.len();
    if n == 0 {
        return StatisticalMetrics::empty();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std_dev = if n <= 1 {
        0.0
    } else {
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    let critical = if n >= 30 {
        CRITICAL_LARGE_SAMPLE
    } else {
        CRITICAL_SMALL_SAMPLE
    };
    let margin = critical * std_dev / (n as f64).sqrt();

    StatisticalMetrics {
        mean,
        median: percentile(&sorted, 50.0),
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
        sample_size: n,
        ci_lower: mean - margin,
        ci_upper: mean + margin,
    }
}

/// Linearly interpolated percentile over a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let fraction = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
    }
}

/// Computes resilience metrics from behavior samples and recovery timings.
pub struct ResilienceAnalyzer {
    scoring: ScoringConfig,
}

impl ResilienceAnalyzer {
    /// Create an analyzer with the given scoring calibration.
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Compute the full resilience measurement.
    ///
    /// `recovery_times_secs` carries the measured recovery durations (one
    /// per recovery attempt; empty when no heal ran). `window_secs` is the
    /// measurement window length.
    pub fn analyze(
        &self,
        samples: &[BehaviorSample],
        recovery_times_secs: &[f64],
        window_secs: f64,
    ) -> ResilienceMetrics {
        let availability: Vec<f64> = samples.iter().filter_map(|s| s.availability()).collect();
        let error_rate: Vec<f64> = samples.iter().filter_map(|s| s.error_rate()).collect();
        let response_time: Vec<f64> = samples
            .iter()
            .filter_map(|s| s.mean_response_time_secs())
            .collect();

        let availability_stats = compute_stats(&availability);
        let error_rate_stats = compute_stats(&error_rate);
        let response_time_stats = compute_stats(&response_time);
        let recovery_time_stats = compute_stats(recovery_times_secs);

        // Zero-sample dimensions earn no credit rather than a vacuous
        // perfect score.
        let availability_score = clamp01(availability_stats.mean);
        let error_tolerance_score = if error_rate_stats.sample_size == 0 {
            0.0
        } else {
            clamp01(1.0 - error_rate_stats.mean)
        };
        let performance_score = if response_time_stats.sample_size == 0 {
            0.0
        } else {
            let threshold = self.scoring.response_time_threshold_secs;
            clamp01((threshold - response_time_stats.mean) / threshold)
        };
        let recovery_score = if recovery_time_stats.sample_size == 0 {
            0.0
        } else {
            let threshold = self.scoring.recovery_time_threshold_secs;
            clamp01((threshold - recovery_time_stats.mean) / threshold)
        };

        let overall_score = clamp01(
            self.scoring.availability_weight * availability_score
                + self.scoring.error_tolerance_weight * error_tolerance_score
                + self.scoring.performance_weight * performance_score
                + self.scoring.recovery_weight * recovery_score,
        );

        let total_samples = availability_stats.sample_size
            + error_rate_stats.sample_size
            + response_time_stats.sample_size
            + recovery_time_stats.sample_size;

        let min = self.scoring.min_samples_for_confidence;
        let confidence = if total_samples >= 3 * min {
            ConfidenceLevel::High
        } else if total_samples >= min {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };

        ResilienceMetrics {
            availability_stats,
            error_rate_stats,
            response_time_stats,
            recovery_time_stats,
            availability_score,
            error_tolerance_score,
            performance_score,
            recovery_score,
            overall_score,
            confidence,
            confidence_value: confidence.value(),
            window_secs,
            total_samples,
        }
    }
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
