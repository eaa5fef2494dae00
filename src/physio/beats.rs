//! Time-domain beat detection over the filtered signal.
//!
//! Finds prominent peaks in the most recent window, converts consecutive
//! peak timestamps into beat intervals, and averages the per-interval
//! instantaneous rates into one BPM estimate.

use ndarray::Array1;
use tracing::{debug, warn};

use crate::{MAX_INTERVAL_MS, MIN_INTERVAL_MS};

/// A validated spacing between two consecutive detected beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatInterval {
    pub duration_ms: i64,
    /// Timestamp of the later beat of the pair.
    pub timestamp_ms: i64,
}

/// Peak-detection configuration.
#[derive(Debug, Clone)]
pub struct BeatConfig {
    /// Number of recent filtered samples to search.
    pub window: usize,
    /// Below this many filtered samples no detection is attempted.
    pub min_samples: usize,
    /// Candidate peaks must exceed mean + range * this ratio.
    pub min_peak_height_ratio: f64,
    /// Accepted peaks must rise at least range * this ratio above their
    /// surrounding valleys.
    pub prominence_ratio: f64,
    /// Minimum spacing (samples) between accepted peaks.
    pub min_peak_distance: usize,
    /// How far (samples) to scan each side of a candidate for its valleys.
    pub valley_scan: usize,
    /// Intervals outside [min, max] ms are physiologically implausible and
    /// get dropped.
    pub min_interval_ms: i64,
    pub max_interval_ms: i64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            window: 75,
            min_samples: 15,
            min_peak_height_ratio: 0.05,
            prominence_ratio: 0.05,
            min_peak_distance: 2,
            valley_scan: 20,
            min_interval_ms: MIN_INTERVAL_MS,
            max_interval_ms: MAX_INTERVAL_MS,
        }
    }
}

/// Everything one detection pass produced.
#[derive(Debug, Clone, Default)]
pub struct BeatEstimate {
    /// Mean instantaneous BPM, `None` when no valid beats were found.
    pub bpm: Option<f64>,
    /// Instantaneous BPM of each validated interval, in beat order.
    pub interval_bpms: Vec<f64>,
    /// Validated beat intervals, in beat order.
    pub intervals: Vec<BeatInterval>,
    /// Timestamps of every accepted peak, ascending.
    pub peak_timestamps: Vec<i64>,
}

/// Prominence-based peak detector and interval builder.
pub struct BeatDetector {
    config: BeatConfig,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self::with_config(BeatConfig::default())
    }

    pub fn with_config(config: BeatConfig) -> Self {
        Self { config }
    }

    /// Detect beats in the most recent window of `filtered`.
    ///
    /// `timestamps` must be index-aligned with `filtered`; both tails are
    /// windowed together.
    pub fn detect(&self, filtered: &Array1<f64>, timestamps: &[i64]) -> BeatEstimate {
        let n = filtered.len().min(timestamps.len());
        if n < self.config.min_samples {
            return BeatEstimate::default();
        }

        let take = n.min(self.config.window);
        let values: Vec<f64> = filtered.iter().skip(filtered.len() - take).copied().collect();
        let window_ts = &timestamps[timestamps.len() - take..];

        let peaks = self.find_peaks(&values);
        if peaks.is_empty() {
            warn!(samples = take, "no peaks found in window");
            return BeatEstimate::default();
        }
        let peak_timestamps: Vec<i64> = peaks.iter().map(|&i| window_ts[i]).collect();

        let mut intervals = Vec::with_capacity(peak_timestamps.len().saturating_sub(1));
        let mut interval_bpms = Vec::with_capacity(intervals.capacity());
        for pair in peak_timestamps.windows(2) {
            let duration_ms = pair[1] - pair[0];
            if duration_ms < self.config.min_interval_ms
                || duration_ms > self.config.max_interval_ms
            {
                debug!(duration_ms, "dropping implausible beat interval");
                continue;
            }
            intervals.push(BeatInterval {
                duration_ms,
                timestamp_ms: pair[1],
            });
            interval_bpms.push(60000.0 / duration_ms as f64);
        }

        if interval_bpms.is_empty() {
            warn!(
                peaks = peak_timestamps.len(),
                "no valid beat intervals in window"
            );
            return BeatEstimate {
                peak_timestamps,
                ..BeatEstimate::default()
            };
        }

        let bpm = interval_bpms.iter().sum::<f64>() / interval_bpms.len() as f64;
        BeatEstimate {
            bpm: Some(bpm),
            interval_bpms,
            intervals,
            peak_timestamps,
        }
    }

    /// Indices of accepted peaks, ascending.
    fn find_peaks(&self, values: &[f64]) -> Vec<usize> {
        let take = values.len();
        if take < 3 {
            return Vec::new();
        }

        let mean = values.iter().sum::<f64>() / take as f64;
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let range = max - min;

        let min_peak_height = mean + range * self.config.min_peak_height_ratio;
        let min_prominence = range * self.config.prominence_ratio;

        let mut peaks: Vec<usize> = Vec::new();
        for i in 1..take - 1 {
            let v = values[i];
            if v <= values[i - 1] || v <= values[i + 1] || v <= min_peak_height {
                continue;
            }

            // Prominence against the deepest point reachable within the
            // scan distance on each side.
            let left_start = i.saturating_sub(self.config.valley_scan);
            let left_valley = values[left_start..i]
                .iter()
                .cloned()
                .fold(f64::MAX, f64::min);
            let right_end = (i + 1 + self.config.valley_scan).min(take);
            let right_valley = values[i + 1..right_end]
                .iter()
                .cloned()
                .fold(f64::MAX, f64::min);
            let prominence = v - left_valley.max(right_valley);
            if prominence <= min_prominence {
                continue;
            }

            if let Some(&last) = peaks.last() {
                if i - last < self.config.min_peak_distance {
                    continue;
                }
            }
            peaks.push(i);
        }
        peaks
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}
