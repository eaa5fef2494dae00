//! The per-sample processing pass.
//!
//! Every `add_sample` call runs the whole chain - channel selection,
//! band-limiting, quality scoring, time- and frequency-domain estimation,
//! fusion, HRV - over the current buffer and returns synchronously. One
//! processor instance owns all of its state and is meant for one
//! measurement session at a time; callers on a capture thread must
//! serialize access themselves.

use std::collections::VecDeque;

use tracing::debug;

use crate::buffer::{Sample, SampleBuffer};
use crate::channel::{ChannelConfig, ChannelSelector, PpgChannel};
use crate::dsp::{
    BandpassConfig, BandpassFilter, QualityAnalyzer, QualityConfig, QualityReport, SpectralConfig,
    SpectralEstimator,
};
use crate::physio::{BeatConfig, BeatDetector, HrvConfig, HrvEstimator};
use crate::{FFT_SIZE, MAX_HEART_RATE_BPM, MIN_HEART_RATE_BPM, MIN_SAMPLES, SAMPLE_RATE_HZ};

/// Pipeline configuration, aggregating every stage's tuning.
#[derive(Debug, Clone)]
pub struct PpgConfig {
    /// Buffer starts evicting past this many samples.
    pub buffer_capacity: usize,
    /// No estimation is attempted below this many buffered samples.
    pub min_samples: usize,
    /// Frame spacing (ms) assumed by `add_sample` when the caller supplies
    /// no timestamps.
    pub nominal_interval_ms: f64,
    pub channel: ChannelConfig,
    pub bandpass: BandpassConfig,
    pub quality: QualityConfig,
    pub beats: BeatConfig,
    pub spectral: SpectralConfig,
    pub hrv: HrvConfig,
    /// Bound on the per-interval BPM history exposed in `SignalStats`.
    pub bpm_history_len: usize,
    /// Bound on the fused-estimate history behind the stability flag.
    pub fused_history_len: usize,
    /// Stability needs at least this many fused estimates...
    pub stability_min_estimates: usize,
    /// ...and at least this quality.
    pub stability_min_quality: f64,
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 2 * FFT_SIZE,
            min_samples: MIN_SAMPLES,
            nominal_interval_ms: 1000.0 / SAMPLE_RATE_HZ,
            channel: ChannelConfig::default(),
            bandpass: BandpassConfig::default(),
            quality: QualityConfig::default(),
            beats: BeatConfig::default(),
            spectral: SpectralConfig::default(),
            hrv: HrvConfig::default(),
            bpm_history_len: 20,
            fused_history_len: 10,
            stability_min_estimates: 5,
            stability_min_quality: 0.7,
        }
    }
}

/// What one `add_sample` call reports back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PpgResult {
    /// Estimated heart rate; 0 means "no valid estimate yet", never a
    /// physiological reading.
    pub heart_rate: i32,
    /// RMSSD over this pass's validated beat intervals (ms); 0 when fewer
    /// than the minimum interval count was found.
    pub hrv: f64,
    /// Signal quality in [0, 1].
    pub quality: f64,
    /// Samples currently buffered.
    pub samples: usize,
    /// Whether the estimate has settled enough to display prominently.
    pub is_stable: bool,
}

impl PpgResult {
    fn empty(samples: usize) -> Self {
        Self {
            heart_rate: 0,
            hrv: 0.0,
            quality: 0.0,
            samples,
            is_stable: false,
        }
    }
}

/// Read-only telemetry snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalStats {
    pub samples: usize,
    pub quality: f64,
    pub strength: f64,
    pub noise: f64,
    /// Recent per-interval instantaneous BPM values, oldest first.
    pub heart_rate_history: Vec<i32>,
}

/// Camera-PPG heart-rate pipeline.
pub struct PpgProcessor {
    config: PpgConfig,
    buffer: SampleBuffer,
    selector: ChannelSelector,
    filter: BandpassFilter,
    quality: QualityAnalyzer,
    beats: BeatDetector,
    spectral: SpectralEstimator,
    hrv: HrvEstimator,
    /// Last quality report; retained when the analyzer skips a short window.
    last_quality: QualityReport,
    /// Channel the most recent pass analyzed.
    last_channel: PpgChannel,
    /// Per-interval BPM values, bounded to `bpm_history_len`.
    bpm_history: VecDeque<i32>,
    /// Valid fused estimates, bounded to `fused_history_len`.
    fused_history: VecDeque<i32>,
    /// Nominal clock for callers without frame timestamps.
    clock_ms: f64,
}

impl PpgProcessor {
    pub fn new() -> Self {
        Self::with_config(PpgConfig::default())
    }

    pub fn with_config(config: PpgConfig) -> Self {
        Self {
            buffer: SampleBuffer::with_capacity(config.buffer_capacity),
            selector: ChannelSelector::with_config(config.channel.clone()),
            filter: BandpassFilter::with_config(config.bandpass.clone()),
            quality: QualityAnalyzer::with_config(config.quality.clone()),
            beats: BeatDetector::with_config(config.beats.clone()),
            spectral: SpectralEstimator::with_config(config.spectral.clone()),
            hrv: HrvEstimator::with_config(config.hrv.clone()),
            config,
            last_quality: QualityReport::default(),
            last_channel: PpgChannel::Red,
            bpm_history: VecDeque::new(),
            fused_history: VecDeque::new(),
            clock_ms: 0.0,
        }
    }

    /// Feed one frame's RGB means, stamped on the pipeline's nominal clock.
    pub fn add_sample(&mut self, red: f64, green: f64, blue: f64) -> PpgResult {
        let timestamp_ms = self.clock_ms.round() as i64;
        self.clock_ms += self.config.nominal_interval_ms;
        self.push_and_process(Sample {
            red,
            green,
            blue,
            timestamp_ms,
        })
    }

    /// Feed one frame's RGB means with the capture side's own timestamp
    /// (ms, monotonic non-decreasing).
    pub fn add_sample_at(&mut self, red: f64, green: f64, blue: f64, timestamp_ms: i64) -> PpgResult {
        self.clock_ms = timestamp_ms as f64 + self.config.nominal_interval_ms;
        self.push_and_process(Sample {
            red,
            green,
            blue,
            timestamp_ms,
        })
    }

    /// Legacy single-channel form: all three channels equal to `value`.
    pub fn add_sample_mono(&mut self, value: f64) -> PpgResult {
        self.add_sample(value, value, value)
    }

    /// Read-only snapshot; repeated calls without an intervening
    /// `add_sample` return identical results.
    pub fn signal_stats(&self) -> SignalStats {
        SignalStats {
            samples: self.buffer.len(),
            quality: self.last_quality.quality,
            strength: self.last_quality.strength,
            noise: self.last_quality.noise,
            heart_rate_history: self.bpm_history.iter().copied().collect(),
        }
    }

    /// Channel the most recent pass analyzed.
    pub fn selected_channel(&self) -> PpgChannel {
        self.last_channel
    }

    /// Whether enough samples are buffered for estimation to run.
    pub fn is_ready(&self) -> bool {
        self.buffer.len() >= self.config.min_samples
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Reset every buffer, history and scalar back to the freshly
    /// constructed state. Idempotent.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.bpm_history.clear();
        self.fused_history.clear();
        self.last_quality = QualityReport::default();
        self.last_channel = PpgChannel::Red;
        self.clock_ms = 0.0;
    }

    fn push_and_process(&mut self, sample: Sample) -> PpgResult {
        self.buffer.push(sample);
        self.process_pass()
    }

    fn process_pass(&mut self) -> PpgResult {
        let samples = self.buffer.len();
        if samples < self.config.min_samples {
            return PpgResult::empty(samples);
        }

        let selected = self.selector.select(&self.buffer);
        self.last_channel = selected.channel;

        let filtered = self.filter.apply(&selected.values);

        if let Some(report) = self.quality.analyze(&filtered) {
            self.last_quality = report;
        }
        let quality = self.last_quality.quality;

        let timestamps: Vec<i64> = self.buffer.timestamps().collect();
        let beat = self.beats.detect(&filtered, &timestamps);
        for &bpm in &beat.interval_bpms {
            push_bounded(
                &mut self.bpm_history,
                bpm.round() as i32,
                self.config.bpm_history_len,
            );
        }

        let spectral_bpm = self.spectral.estimate(&filtered);

        // Quality-weighted fusion: the noisier the signal, the more the
        // spectral estimate dominates.
        let fused = match (beat.bpm, spectral_bpm) {
            (Some(t), Some(f)) => Some(t * quality + f * (1.0 - quality)),
            (Some(t), None) => Some(t),
            (None, Some(f)) => Some(f),
            (None, None) => None,
        };

        let heart_rate = match fused {
            Some(bpm) if (MIN_HEART_RATE_BPM..=MAX_HEART_RATE_BPM).contains(&bpm) => {
                bpm.round() as i32
            }
            Some(bpm) => {
                debug!(bpm, "fused estimate outside reportable range");
                0
            }
            None => 0,
        };

        if heart_rate > 0 {
            push_bounded(
                &mut self.fused_history,
                heart_rate,
                self.config.fused_history_len,
            );
        }

        let is_stable = self.fused_history.len() >= self.config.stability_min_estimates
            && quality > self.config.stability_min_quality;

        let hrv = self
            .hrv
            .compute(&beat.intervals)
            .map(|m| m.rmssd_ms)
            .unwrap_or(0.0);

        PpgResult {
            heart_rate,
            hrv,
            quality,
            samples,
            is_stable,
        }
    }
}

impl Default for PpgProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(history: &mut VecDeque<i32>, value: i32, bound: usize) {
    history.push_back(value);
    while history.len() > bound {
        history.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Red oscillating at `freq_hz` around a mid exposure, green steady.
    fn feed_oscillating_red(processor: &mut PpgProcessor, n: usize, freq_hz: f64) -> PpgResult {
        let mut last = PpgResult::empty(0);
        for i in 0..n {
            let t = i as f64 / SAMPLE_RATE_HZ;
            let red = 128.0 + 20.0 * (2.0 * PI * freq_hz * t).sin();
            last = processor.add_sample(red, 80.0, 60.0);
        }
        last
    }

    #[test]
    fn test_underfilled_buffer_reports_nothing() {
        let mut processor = PpgProcessor::new();
        for i in 0..(MIN_SAMPLES - 1) {
            let result = processor.add_sample(100.0, 90.0, 80.0);
            assert_eq!(result.heart_rate, 0, "sample {i} produced an estimate");
            assert!(!result.is_stable);
        }
        assert!(!processor.is_ready());
    }

    #[test]
    fn test_sixty_bpm_oscillation() {
        let mut processor = PpgProcessor::new();
        let result = feed_oscillating_red(&mut processor, 90, 1.0);

        assert!(
            (55..=65).contains(&result.heart_rate),
            "expected ~60 BPM, got {}",
            result.heart_rate
        );
        assert!(result.quality > 0.0);
        assert_eq!(processor.selected_channel(), PpgChannel::Red);
    }

    #[test]
    fn test_flat_input_reports_nothing() {
        let mut processor = PpgProcessor::new();
        let mut last = PpgResult::empty(0);
        for _ in 0..40 {
            last = processor.add_sample(100.0, 100.0, 100.0);
        }
        assert_eq!(last.heart_rate, 0);
        assert_eq!(last.quality, 0.0);
    }

    #[test]
    fn test_heart_rate_range_invariant() {
        // Deterministic pseudo-random junk must never push an estimate
        // outside [30, 150].
        let mut processor = PpgProcessor::new();
        let mut state: u64 = 0x2545F491;
        for _ in 0..400 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let r = (state >> 33) as f64 % 256.0;
            let g = (state >> 17) as f64 % 256.0;
            let result = processor.add_sample(r, g, 128.0);
            assert!(
                result.heart_rate == 0 || (30..=150).contains(&result.heart_rate),
                "heart_rate {} out of range",
                result.heart_rate
            );
        }
    }

    #[test]
    fn test_buffer_bound_holds() {
        let mut processor = PpgProcessor::new();
        for _ in 0..3000 {
            processor.add_sample(100.0, 90.0, 80.0);
        }
        assert_eq!(processor.buffer_len(), 2 * FFT_SIZE);
        assert_eq!(processor.signal_stats().samples, 2 * FFT_SIZE);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut processor = PpgProcessor::new();
        feed_oscillating_red(&mut processor, 90, 1.0);

        processor.clear();
        let stats = processor.signal_stats();
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.quality, 0.0);
        assert_eq!(stats.strength, 0.0);
        assert_eq!(stats.noise, 0.0);
        assert!(stats.heart_rate_history.is_empty());

        // A cleared processor behaves like a fresh one.
        let mut fresh = PpgProcessor::new();
        let from_cleared = feed_oscillating_red(&mut processor, 90, 1.0);
        let from_fresh = feed_oscillating_red(&mut fresh, 90, 1.0);
        assert_eq!(from_cleared, from_fresh);
    }

    #[test]
    fn test_signal_stats_read_is_idempotent() {
        let mut processor = PpgProcessor::new();
        feed_oscillating_red(&mut processor, 60, 1.0);
        assert_eq!(processor.signal_stats(), processor.signal_stats());
    }

    #[test]
    fn test_bpm_history_is_bounded() {
        let mut processor = PpgProcessor::new();
        feed_oscillating_red(&mut processor, 300, 1.0);
        assert!(processor.signal_stats().heart_rate_history.len() <= 20);
    }

    #[test]
    fn test_mono_form_matches_triple_form() {
        let mut mono = PpgProcessor::new();
        let mut triple = PpgProcessor::new();
        for i in 0..60 {
            let v = 100.0 + (i as f64 * 0.9).sin() * 15.0;
            let a = mono.add_sample_mono(v);
            let b = triple.add_sample(v, v, v);
            assert_eq!(a, b);
        }
    }
}
