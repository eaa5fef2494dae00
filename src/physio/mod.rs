//! Beat-level physiology: peak detection, beat intervals, HRV.

mod beats;
mod hrv;

pub use beats::{BeatConfig, BeatDetector, BeatEstimate, BeatInterval};
pub use hrv::{HrvConfig, HrvEstimator, HrvMetrics};
