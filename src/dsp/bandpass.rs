//! Band-limiting filter chain for the raw PPG signal.
//!
//! Detrend, one-pole low-pass, one-pole high-pass, 3-point smoothing, then a
//! fixed gain. Both IIR stages are first-order approximations with
//! `alpha = 1/(1 + 2*pi*fc/fs)`.

use ndarray::Array1;
use std::f64::consts::PI;

use crate::{HIGH_CUTOFF_HZ, LOW_CUTOFF_HZ, SAMPLE_RATE_HZ};

/// Filter chain configuration.
#[derive(Debug, Clone)]
pub struct BandpassConfig {
    /// Nominal sample rate (Hz).
    pub sample_rate: f64,
    /// High-pass cutoff (Hz); frequencies below are attenuated.
    pub low_cutoff: f64,
    /// Low-pass cutoff (Hz); frequencies above are attenuated.
    pub high_cutoff: f64,
    /// Fixed output gain compensating for the small raw-signal variance of
    /// skin reflectance.
    pub amplification: f64,
    /// Below this length the input is passed through unchanged.
    pub min_samples: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            low_cutoff: LOW_CUTOFF_HZ,
            high_cutoff: HIGH_CUTOFF_HZ,
            amplification: 50.0,
            min_samples: 10,
        }
    }
}

/// Band-limiting filter over a whole signal window.
pub struct BandpassFilter {
    config: BandpassConfig,
}

impl BandpassFilter {
    pub fn new() -> Self {
        Self::with_config(BandpassConfig::default())
    }

    pub fn with_config(config: BandpassConfig) -> Self {
        Self { config }
    }

    /// Run the full chain over `raw`, returning a same-length signal.
    ///
    /// Inputs shorter than `min_samples` come back unchanged.
    pub fn apply(&self, raw: &[f64]) -> Array1<f64> {
        let n = raw.len();
        if n < self.config.min_samples {
            return Array1::from(raw.to_vec());
        }

        let fs = self.config.sample_rate;

        // 1. Detrend: remove the DC / ambient-light offset.
        let mean = raw.iter().sum::<f64>() / n as f64;
        let mut signal: Vec<f64> = raw.iter().map(|x| x - mean).collect();

        // 2. Low-pass: exponential smoothing, alpha = 1/(1 + 2*pi*fc/fs).
        let lp_alpha = 1.0 / (1.0 + 2.0 * PI * self.config.high_cutoff / fs);
        for i in 1..n {
            signal[i] = lp_alpha * signal[i] + (1.0 - lp_alpha) * signal[i - 1];
        }

        // 3. High-pass: y[i] = alpha * (y[i-1] + x[i] - x[i-1]), y[0] = 0.
        let hp_alpha = 1.0 / (1.0 + 2.0 * PI * self.config.low_cutoff / fs);
        let mut prev_in = signal[0];
        let mut prev_out = 0.0;
        for i in 1..n {
            let out = hp_alpha * (prev_out + signal[i] - prev_in);
            prev_in = signal[i];
            prev_out = out;
            signal[i] = out;
        }
        signal[0] = 0.0;

        // 4. 3-point moving average, endpoints unchanged.
        let mut smoothed = signal.clone();
        for i in 1..n - 1 {
            smoothed[i] = (signal[i - 1] + signal[i] + signal[i + 1]) / 3.0;
        }

        // 5. Gain.
        let gain = self.config.amplification;
        Array1::from_iter(smoothed.into_iter().map(|x| x * gain))
    }
}

impl Default for BandpassFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_short_input_passes_through() {
        let filter = BandpassFilter::new();
        let raw = vec![5.0, 6.0, 7.0];
        let out = filter.apply(&raw);
        assert_eq!(out.to_vec(), raw);
    }

    #[test]
    fn test_flat_input_filters_to_zero() {
        let filter = BandpassFilter::new();
        let raw = vec![100.0; 40];
        let out = filter.apply(&raw);
        for &v in out.iter() {
            assert_relative_eq!(v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_preserves_length() {
        let filter = BandpassFilter::new();
        let raw: Vec<f64> = (0..60).map(|i| (i as f64 * 0.7).sin()).collect();
        assert_eq!(filter.apply(&raw).len(), 60);
    }

    #[test]
    fn test_in_band_oscillation_survives() {
        // 1 Hz at the nominal 3 Hz rate sits inside the 0.67-2.0 Hz band.
        let filter = BandpassFilter::new();
        let raw: Vec<f64> = (0..90)
            .map(|i| 128.0 + 20.0 * (2.0 * PI * i as f64 / 3.0).sin())
            .collect();
        let out = filter.apply(&raw);

        // Skip the transient, then the output must still swing.
        let tail = &out.to_vec()[30..];
        let max = tail.iter().cloned().fold(f64::MIN, f64::max);
        let min = tail.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max - min > 10.0, "band was flattened: range {}", max - min);
    }

    #[test]
    fn test_amplification_scales_output() {
        let raw: Vec<f64> = (0..60)
            .map(|i| 100.0 + (2.0 * PI * i as f64 / 3.0).sin())
            .collect();

        let unit = BandpassFilter::with_config(BandpassConfig {
            amplification: 1.0,
            ..BandpassConfig::default()
        });
        let gained = BandpassFilter::new();

        let a = unit.apply(&raw);
        let b = gained.apply(&raw);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x * 50.0, *y, epsilon = 1e-9);
        }
    }
}
