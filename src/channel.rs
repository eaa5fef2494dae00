//! Adaptive channel selection based on exposure statistics.
//!
//! Fingertip-on-lens PPG normally rides on the red channel, but exposure
//! drifts session to session: a torch-lit finger can saturate red entirely,
//! and dim ambient light can starve it. The selector picks the channel (or
//! red/green average) that still carries pulse information, re-evaluated on
//! every processing pass.

use crate::buffer::SampleBuffer;

/// Which signal source the pipeline is analyzing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpgChannel {
    Red,
    Green,
    RedGreenAverage,
}

/// Exposure thresholds for the channel decision.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Mean red above this means the red channel is saturated.
    pub saturation_threshold: f64,
    /// Mean red below this means the red channel is underexposed.
    pub low_signal_threshold: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: 220.0,
            low_signal_threshold: 50.0,
        }
    }
}

/// The chosen raw signal plus which channel produced it.
#[derive(Debug, Clone)]
pub struct SelectedSignal {
    pub values: Vec<f64>,
    pub channel: PpgChannel,
}

/// Picks the analysis channel from buffered red/green statistics.
pub struct ChannelSelector {
    config: ChannelConfig,
}

impl ChannelSelector {
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    pub fn with_config(config: ChannelConfig) -> Self {
        Self { config }
    }

    /// Select the raw signal for this pass.
    ///
    /// Decision on `mean(red)`, first match wins:
    /// 1. above `saturation_threshold`: red is clipped, use green
    /// 2. below `low_signal_threshold`: red is starved, average red and
    ///    green to recover some SNR
    /// 3. otherwise: use red
    pub fn select(&self, buffer: &SampleBuffer) -> SelectedSignal {
        let n = buffer.len();
        if n == 0 {
            return SelectedSignal {
                values: Vec::new(),
                channel: PpgChannel::Red,
            };
        }

        let mean_red = buffer.red().sum::<f64>() / n as f64;

        if mean_red > self.config.saturation_threshold {
            SelectedSignal {
                values: buffer.green().collect(),
                channel: PpgChannel::Green,
            }
        } else if mean_red < self.config.low_signal_threshold {
            SelectedSignal {
                values: buffer
                    .red()
                    .zip(buffer.green())
                    .map(|(r, g)| (r + g) / 2.0)
                    .collect(),
                channel: PpgChannel::RedGreenAverage,
            }
        } else {
            SelectedSignal {
                values: buffer.red().collect(),
                channel: PpgChannel::Red,
            }
        }
    }
}

impl Default for ChannelSelector {
    fn default() -> Self {
        Self::new()
    }
}
