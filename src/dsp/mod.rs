//! Signal conditioning and spectral analysis.
//!
//! - `BandpassFilter` - detrend + band-limit + smooth + amplify the raw signal
//! - `QualityAnalyzer` - signal strength / noise scoring with motion-artifact
//!   detection
//! - `SpectralEstimator` - FFT-based dominant-frequency heart-rate estimate

mod bandpass;
mod quality;
mod spectral;

pub use bandpass::{BandpassConfig, BandpassFilter};
pub use quality::{QualityAnalyzer, QualityConfig, QualityReport};
pub use spectral::{SpectralConfig, SpectralEstimator};
