//! Frequency-domain heart-rate estimation.
//!
//! Hamming-windowed FFT over the most recent filtered samples, then a
//! dominant-peak search restricted to the pulse band.

use ndarray::Array1;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use tracing::warn;

use crate::{
    FFT_SIZE, HIGH_CUTOFF_HZ, LOW_CUTOFF_HZ, MAX_HEART_RATE_BPM, MIN_HEART_RATE_BPM,
    SAMPLE_RATE_HZ,
};

/// Spectral estimator configuration.
#[derive(Debug, Clone)]
pub struct SpectralConfig {
    /// Transform length; shorter inputs are zero-padded on the right.
    pub fft_size: usize,
    /// Nominal sample rate (Hz).
    pub sample_rate: f64,
    /// Lower edge of the searched band (Hz).
    pub low_cutoff: f64,
    /// Upper edge of the searched band (Hz).
    pub high_cutoff: f64,
    /// Reported estimates outside [min_bpm, max_bpm] are rejected.
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// A winning bin must exceed this multiple of the in-band mean magnitude.
    pub peak_threshold_ratio: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            sample_rate: SAMPLE_RATE_HZ,
            low_cutoff: LOW_CUTOFF_HZ,
            high_cutoff: HIGH_CUTOFF_HZ,
            min_bpm: MIN_HEART_RATE_BPM,
            max_bpm: MAX_HEART_RATE_BPM,
            peak_threshold_ratio: 1.5,
        }
    }
}

/// FFT-based dominant-frequency estimator.
pub struct SpectralEstimator {
    config: SpectralConfig,
    fft_planner: FftPlanner<f64>,
}

impl SpectralEstimator {
    pub fn new() -> Self {
        Self::with_config(SpectralConfig::default())
    }

    pub fn with_config(config: SpectralConfig) -> Self {
        Self {
            config,
            fft_planner: FftPlanner::new(),
        }
    }

    /// Estimate BPM from the dominant in-band frequency.
    ///
    /// Needs at least half a transform's worth of filtered signal; returns
    /// `None` otherwise, and `None` when no bin stands out of the band.
    pub fn estimate(&mut self, filtered: &Array1<f64>) -> Option<f64> {
        let n = filtered.len();
        let size = self.config.fft_size;
        if n < size / 2 {
            return None;
        }

        // Last `size` samples, zero-padded on the right when fewer exist.
        let take = n.min(size);
        let start = n - take;
        let denom = (size - 1) as f64;
        let mut buffer: Vec<Complex64> = (0..size)
            .map(|i| {
                let x = if i < take { filtered[start + i] } else { 0.0 };
                let w = 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos();
                Complex64::new(x * w, 0.0)
            })
            .collect();

        let fft = self.fft_planner.plan_fft_forward(size);
        fft.process(&mut buffer);

        // Pulse-band bins, limited to the first half (real input symmetry).
        let half = size / 2;
        let min_bin = (self.config.low_cutoff * size as f64 / self.config.sample_rate) as usize;
        let max_bin = ((self.config.high_cutoff * size as f64 / self.config.sample_rate) as usize)
            .min(half - 1);
        if min_bin >= max_bin {
            return None;
        }

        let magnitudes: Vec<f64> = (min_bin..=max_bin).map(|i| buffer[i].norm()).collect();
        let average = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
        let min_threshold = average * self.config.peak_threshold_ratio;

        // Strongest local maximum that clears the threshold.
        let mut best: Option<(usize, f64)> = None;
        for i in 1..magnitudes.len() - 1 {
            let m = magnitudes[i];
            if m > magnitudes[i - 1] && m > magnitudes[i + 1] && m > min_threshold {
                match best {
                    Some((_, best_m)) if best_m >= m => {}
                    _ => best = Some((min_bin + i, m)),
                }
            }
        }

        let (bin, _) = match best {
            Some(found) => found,
            None => {
                warn!("no dominant frequency in the pulse band");
                return None;
            }
        };

        let freq = bin as f64 * self.config.sample_rate / size as f64;
        let bpm = freq * 60.0;
        if bpm < self.config.min_bpm || bpm > self.config.max_bpm {
            warn!(bpm, "dominant frequency outside the reportable range");
            return None;
        }
        Some(bpm)
    }
}

impl Default for SpectralEstimator {
    fn default() -> Self {
        Self::new()
    }
}
