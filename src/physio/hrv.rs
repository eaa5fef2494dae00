//! Heart-rate variability over validated beat intervals.

use super::beats::BeatInterval;

/// HRV computation configuration.
#[derive(Debug, Clone)]
pub struct HrvConfig {
    /// Fewer intervals than this and no metrics are produced.
    pub min_intervals: usize,
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self { min_intervals: 5 }
    }
}

/// Summary statistics over one pass's beat intervals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HrvMetrics {
    /// Root mean square of successive interval differences (ms).
    pub rmssd_ms: f64,
    /// Standard deviation of the interval durations (ms).
    pub sdnn_ms: f64,
    pub mean_interval_ms: f64,
}

/// RMSSD-based HRV estimator.
pub struct HrvEstimator {
    config: HrvConfig,
}

impl HrvEstimator {
    pub fn new() -> Self {
        Self::with_config(HrvConfig::default())
    }

    pub fn with_config(config: HrvConfig) -> Self {
        Self { config }
    }

    /// Compute HRV metrics, or `None` below the interval minimum.
    pub fn compute(&self, intervals: &[BeatInterval]) -> Option<HrvMetrics> {
        if intervals.len() < self.config.min_intervals {
            return None;
        }

        let durations: Vec<f64> = intervals.iter().map(|i| i.duration_ms as f64).collect();
        let n = durations.len();

        let mean_interval_ms = durations.iter().sum::<f64>() / n as f64;
        let variance = durations
            .iter()
            .map(|d| (d - mean_interval_ms).powi(2))
            .sum::<f64>()
            / n as f64;
        let sdnn_ms = variance.sqrt();

        let diff_sq_sum: f64 = durations.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
        let rmssd_ms = (diff_sq_sum / (n - 1) as f64).sqrt();

        Some(HrvMetrics {
            rmssd_ms,
            sdnn_ms,
            mean_interval_ms,
        })
    }
}

impl Default for HrvEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn intervals(durations: &[i64]) -> Vec<BeatInterval> {
        let mut ts = 0;
        durations
            .iter()
            .map(|&d| {
                ts += d;
                BeatInterval {
                    duration_ms: d,
                    timestamp_ms: ts,
                }
            })
            .collect()
    }

    #[test]
    fn test_too_few_intervals() {
        let estimator = HrvEstimator::new();
        assert!(estimator.compute(&intervals(&[800, 820, 810, 805])).is_none());
    }

    #[test]
    fn test_known_alternating_intervals() {
        let estimator = HrvEstimator::new();
        let metrics = estimator
            .compute(&intervals(&[1000, 1100, 1000, 1100, 1000, 1100]))
            .expect("metrics");

        // Successive differences are all +-100 ms.
        assert_relative_eq!(metrics.rmssd_ms, 100.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.sdnn_ms, 50.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.mean_interval_ms, 1050.0, epsilon = 1e-9);
    }

    #[test]
    fn test_steady_rhythm_has_zero_rmssd() {
        let estimator = HrvEstimator::new();
        let metrics = estimator
            .compute(&intervals(&[1000; 8]))
            .expect("metrics");
        assert_eq!(metrics.rmssd_ms, 0.0);
        assert_eq!(metrics.sdnn_ms, 0.0);
    }

    #[test]
    fn test_jitter_gives_positive_rmssd() {
        let estimator = HrvEstimator::new();
        let metrics = estimator
            .compute(&intervals(&[950, 1010, 980, 1040, 990, 1020]))
            .expect("metrics");
        assert!(metrics.rmssd_ms > 0.0);
    }
}
