//! # pulsecam-signals
//!
//! Photoplethysmography (PPG) signal processing for camera-based heart-rate
//! measurement.
//!
//! The camera side reduces each frame to mean red/green/blue intensities and
//! feeds them in one at a time; this crate turns that stream into:
//! - **Heart rate** (BPM): fused time-domain (beat intervals) and
//!   frequency-domain (FFT) estimates, band-limited to 30-150 BPM
//! - **HRV**: RMSSD over validated beat intervals
//! - **Quality**: a 0..1 signal quality score with motion-artifact detection
//!
//! ## Example
//!
//! ```ignore
//! use pulsecam_signals::PpgProcessor;
//!
//! let mut processor = PpgProcessor::new();
//!
//! // Add RGB frame means from the camera
//! for frame in video_frames {
//!     let result = processor.add_sample(frame.r, frame.g, frame.b);
//!     if result.heart_rate > 0 {
//!         println!("{} BPM (quality {:.2})", result.heart_rate, result.quality);
//!     }
//! }
//! ```
//!
//! A `heart_rate` of 0 always means "no valid estimate yet" - the caller
//! should keep feeding samples, not treat it as an error.

pub mod buffer;
pub mod channel;
pub mod dsp;
pub mod physio;
pub mod pipeline;

pub use buffer::{Sample, SampleBuffer};
pub use channel::{ChannelConfig, ChannelSelector, PpgChannel, SelectedSignal};
pub use dsp::{
    BandpassConfig, BandpassFilter, QualityAnalyzer, QualityConfig, QualityReport, SpectralConfig,
    SpectralEstimator,
};
pub use physio::{
    BeatConfig, BeatDetector, BeatEstimate, BeatInterval, HrvConfig, HrvEstimator, HrvMetrics,
};
pub use pipeline::{PpgConfig, PpgProcessor, PpgResult, SignalStats};

/// Transform length for the frequency-domain estimator.
pub const FFT_SIZE: usize = 512;

/// Nominal processing rate of the pipeline (Hz).
///
/// This is a tuning parameter of the filters, not a hard requirement on how
/// often the camera side calls in.
pub const SAMPLE_RATE_HZ: f64 = 3.0;

/// Lower edge of the pulse band (Hz), 40 BPM.
pub const LOW_CUTOFF_HZ: f64 = 0.67;

/// Upper edge of the pulse band (Hz), 120 BPM.
pub const HIGH_CUTOFF_HZ: f64 = 2.0;

/// Lowest heart rate the pipeline will report (BPM).
pub const MIN_HEART_RATE_BPM: f64 = 30.0;

/// Highest heart rate the pipeline will report (BPM).
pub const MAX_HEART_RATE_BPM: f64 = 150.0;

/// Shortest plausible beat interval (ms), 60000 / MAX_HEART_RATE_BPM.
pub const MIN_INTERVAL_MS: i64 = 400;

/// Longest plausible beat interval (ms), 60000 / MIN_HEART_RATE_BPM.
pub const MAX_INTERVAL_MS: i64 = 2000;

/// Samples required before the pipeline starts estimating.
pub const MIN_SAMPLES: usize = 30;
