//! Signal quality scoring and motion-artifact detection.

use ndarray::Array1;

/// Quality analysis configuration.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Number of recent filtered samples to score.
    pub window: usize,
    /// Below this many filtered samples the analysis is skipped entirely.
    pub min_samples: usize,
    /// First differences beyond this many standard deviations count as
    /// motion outliers.
    pub artifact_sigma: f64,
    /// Outlier fraction above which the window is flagged as motion-corrupted.
    pub artifact_ratio: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            window: 75,
            min_samples: 20,
            artifact_sigma: 3.0,
            artifact_ratio: 0.10,
        }
    }
}

/// Scores for the most recent window of filtered signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualityReport {
    /// Signal quality in [0, 1].
    pub quality: f64,
    /// Standard deviation of the window.
    pub strength: f64,
    /// Mean absolute first difference of the window.
    pub noise: f64,
    /// Whether the window was flagged as motion-corrupted.
    pub motion_artifact: bool,
}

/// Computes an SNR-like quality score over the filtered signal.
pub struct QualityAnalyzer {
    config: QualityConfig,
}

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self::with_config(QualityConfig::default())
    }

    pub fn with_config(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Score the most recent window of `filtered`.
    ///
    /// Returns `None` when there is not enough signal to say anything; the
    /// caller keeps its previous score in that case.
    pub fn analyze(&self, filtered: &Array1<f64>) -> Option<QualityReport> {
        let n = filtered.len();
        if n < self.config.min_samples {
            return None;
        }

        let take = n.min(self.config.window);
        let window: Vec<f64> = filtered.iter().skip(n - take).copied().collect();

        let mean = window.iter().sum::<f64>() / take as f64;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / take as f64;
        let strength = variance.sqrt();

        let diffs: Vec<f64> = window.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let noise = diffs.iter().sum::<f64>() / diffs.len().max(1) as f64;

        let mut quality = if noise > 0.0 {
            (strength / noise).min(1.0)
        } else {
            0.0
        };

        // Motion artifacts: abrupt jumps well outside the window's own spread.
        let jump_threshold = self.config.artifact_sigma * strength;
        let outliers = diffs.iter().filter(|&&d| d > jump_threshold).count();
        let motion_artifact = outliers as f64 / take as f64 > self.config.artifact_ratio;
        if motion_artifact {
            quality /= 2.0;
        }

        Some(QualityReport {
            quality,
            strength,
            noise,
            motion_artifact,
        })
    }
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_too_short_is_skipped() {
        let analyzer = QualityAnalyzer::new();
        let signal = Array1::from(vec![1.0; 10]);
        assert!(analyzer.analyze(&signal).is_none());
    }

    #[test]
    fn test_flat_signal_scores_zero() {
        let analyzer = QualityAnalyzer::new();
        let signal = Array1::from(vec![0.0; 40]);
        let report = analyzer.analyze(&signal).unwrap();
        assert_eq!(report.quality, 0.0);
        assert_eq!(report.strength, 0.0);
        assert_eq!(report.noise, 0.0);
    }

    #[test]
    fn test_clean_oscillation_scores_positive() {
        let analyzer = QualityAnalyzer::new();
        let signal: Array1<f64> = (0..75)
            .map(|i| (2.0 * PI * i as f64 / 3.0).sin() * 30.0)
            .collect();
        let report = analyzer.analyze(&signal).unwrap();
        assert!(report.quality > 0.0);
        assert!(report.quality <= 1.0);
        assert!(report.strength > 0.0);
        assert!(!report.motion_artifact);
    }

    #[test]
    fn test_spiky_window_is_flagged_and_halved() {
        let analyzer = QualityAnalyzer::new();
        // 40 near-zero samples with four isolated 100-unit spikes: each spike
        // contributes two large first differences, putting 8 of 40 samples
        // past the 3-sigma jump threshold.
        let mut values = vec![0.0; 40];
        for &i in &[8, 16, 24, 32] {
            values[i] = 100.0;
        }
        let report = analyzer.analyze(&Array1::from(values)).unwrap();
        assert!(report.motion_artifact);
        assert_relative_eq!(report.quality, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_quality_capped_at_one() {
        let analyzer = QualityAnalyzer::new();
        // Slow ramp: large stddev, small successive differences.
        let signal: Array1<f64> = (0..75).map(|i| i as f64).collect();
        let report = analyzer.analyze(&signal).unwrap();
        assert!(report.quality <= 1.0);
    }
}
