// Feature transformation
// Converts raw multi-channel windows into time-series or time-frequency tensors

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::features::spectrogram::{MelConfig, MelSpectrogram, SpectrogramError};
use crate::features::window::Window;

/// Channels are processed in groups of three (one sensor's x/y/z)
pub const CHANNELS_PER_GROUP: usize = 3;

/// At most 17 groups (51 channels) are transformed into spectrograms
pub const MAX_CHANNEL_GROUPS: usize = 17;

/// Feature representation built for every window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Representation {
    /// Raw samples, `channels x samples`
    TimeSeries,

    /// Per-channel log mel spectrogram
    MelSpectrogram(MelConfig),
}

impl Default for Representation {
    fn default() -> Self {
        Representation::MelSpectrogram(MelConfig::default())
    }
}

/// Canonical stored feature of one example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureTensor {
    /// `[channels x samples]`
    TimeSeries(Array2<f32>),

    /// One `[bands x frames]` dB spectrogram per channel
    Spectrogram(Vec<Array2<f32>>),
}

impl FeatureTensor {
    pub fn num_channels(&self) -> usize {
        match self {
            FeatureTensor::TimeSeries(data) => data.nrows(),
            FeatureTensor::Spectrogram(channels) => channels.len(),
        }
    }

    /// Total number of scalar values
    pub fn len(&self) -> usize {
        match self {
            FeatureTensor::TimeSeries(data) => data.len(),
            FeatureTensor::Spectrogram(channels) => channels.iter().map(|c| c.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major flattening, channel by channel
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        match self {
            FeatureTensor::TimeSeries(data) => out.extend(data.iter().copied()),
            FeatureTensor::Spectrogram(channels) => {
                for channel in channels {
                    out.extend(channel.iter().copied());
                }
            }
        }
        out
    }

    /// Apply `f` to every value, keeping the shape
    pub fn map_values<F: Fn(f32) -> f32>(&self, f: F) -> FeatureTensor {
        match self {
            FeatureTensor::TimeSeries(data) => FeatureTensor::TimeSeries(data.mapv(&f)),
            FeatureTensor::Spectrogram(channels) => {
                FeatureTensor::Spectrogram(channels.iter().map(|c| c.mapv(&f)).collect())
            }
        }
    }

    /// (min, max) over all values, `None` when empty
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let values = self.flatten();
        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some((min, max))
    }
}

/// Window-to-feature transform for one representation
#[derive(Debug)]
pub enum FeatureTransformer {
    TimeSeries,
    MelSpectrogram(MelSpectrogram),
}

impl FeatureTransformer {
    pub fn new(representation: &Representation) -> Result<Self, SpectrogramError> {
        match representation {
            Representation::TimeSeries => Ok(FeatureTransformer::TimeSeries),
            Representation::MelSpectrogram(config) => {
                Ok(FeatureTransformer::MelSpectrogram(MelSpectrogram::new(*config)?))
            }
        }
    }

    pub fn transform(&self, window: &Window) -> Result<FeatureTensor, SpectrogramError> {
        match self {
            FeatureTransformer::TimeSeries => {
                Ok(FeatureTensor::TimeSeries(window.samples.t().to_owned()))
            }
            FeatureTransformer::MelSpectrogram(mel) => {
                Ok(FeatureTensor::Spectrogram(stack_spectrograms(mel, window)?))
            }
        }
    }
}

/// Spectrogram of each channel, walking the channel groups in order
/// A trailing group with fewer than three channels is still processed
fn stack_spectrograms(
    mel: &MelSpectrogram,
    window: &Window,
) -> Result<Vec<Array2<f32>>, SpectrogramError> {
    let limit = window
        .num_channels()
        .min(MAX_CHANNEL_GROUPS * CHANNELS_PER_GROUP);
    if limit < window.num_channels() {
        log::debug!(
            "Window has {} channels, transforming the first {}",
            window.num_channels(),
            limit
        );
    }

    let groups = (limit + CHANNELS_PER_GROUP - 1) / CHANNELS_PER_GROUP;
    let mut stacked = Vec::with_capacity(limit);

    for group in 0..groups {
        let first = group * CHANNELS_PER_GROUP;
        let last = (first + CHANNELS_PER_GROUP).min(limit);

        for channel in first..last {
            stacked.push(mel.decibels(&window.channel(channel))?);
        }
    }

    Ok(stacked)
}
