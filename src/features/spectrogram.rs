// Mel spectrogram computation
// Short-time power spectra on a mel-scaled frequency axis, converted to decibels

use ndarray::Array2;
use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Magnitude floor used before taking the logarithm
const AMPLITUDE_FLOOR: f32 = 1e-5;

/// Dynamic range kept below the spectrogram peak
const TOP_DB: f32 = 80.0;

#[derive(Debug, Error)]
pub enum SpectrogramError {
    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),

    #[error("Invalid spectrogram configuration: {0}")]
    InvalidConfig(String),
}

/// Spectrogram resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelConfig {
    /// Sensor sample rate in Hz
    pub sample_rate_hz: u32,

    /// Number of mel bands
    pub bands: usize,

    /// Hop size in samples (advance between frames)
    /// The FFT window is twice the hop
    pub hop_length: usize,
}

impl Default for MelConfig {
    fn default() -> Self {
        MelConfig {
            sample_rate_hz: 500,
            bands: 64,
            hop_length: 50,
        }
    }
}

impl MelConfig {
    pub fn n_fft(&self) -> usize {
        self.hop_length * 2
    }

    /// Frames produced for a waveform of `samples` length (centered framing)
    pub fn num_frames(&self, samples: usize) -> usize {
        if self.hop_length == 0 {
            return 0;
        }
        1 + samples / self.hop_length
    }

    fn validate(&self) -> Result<(), SpectrogramError> {
        if self.hop_length == 0 {
            return Err(SpectrogramError::InvalidConfig("hop_length must be > 0".into()));
        }
        if self.bands == 0 {
            return Err(SpectrogramError::InvalidConfig("bands must be > 0".into()));
        }
        if self.sample_rate_hz == 0 {
            return Err(SpectrogramError::InvalidConfig("sample_rate_hz must be > 0".into()));
        }
        Ok(())
    }
}

/// Planned mel spectrogram transform for one configuration
/// Reusable across every channel of every window
pub struct MelSpectrogram {
    config: MelConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    /// `[bands x (n_fft / 2 + 1)]`
    filterbank: Array2<f32>,
}

impl fmt::Debug for MelSpectrogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelSpectrogram")
            .field("config", &self.config)
            .finish()
    }
}

impl MelSpectrogram {
    pub fn new(config: MelConfig) -> Result<Self, SpectrogramError> {
        config.validate()?;

        let n_fft = config.n_fft();
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);

        let mut window = vec![1.0; n_fft];
        apply_hann_window(&mut window);

        let filterbank = mel_filterbank(config.sample_rate_hz as f32, n_fft, config.bands);

        Ok(MelSpectrogram {
            config,
            fft,
            window,
            filterbank,
        })
    }

    pub fn config(&self) -> &MelConfig {
        &self.config
    }

    /// Mel power spectrogram `[bands x frames]`
    pub fn power(&self, signal: &[f32]) -> Result<Array2<f32>, SpectrogramError> {
        let spectra = self.power_spectra(signal)?;
        Ok(self.filterbank.dot(&spectra))
    }

    /// Log-scaled mel spectrogram in dB, floored at `peak - 80 dB`
    pub fn decibels(&self, signal: &[f32]) -> Result<Array2<f32>, SpectrogramError> {
        let mel = self.power(signal)?;
        Ok(amplitude_to_db(&mel))
    }

    /// Power spectra of centered, Hann-windowed frames
    /// Returns `[(n_fft / 2 + 1) x frames]`
    fn power_spectra(&self, signal: &[f32]) -> Result<Array2<f32>, SpectrogramError> {
        let n_fft = self.config.n_fft();
        let hop = self.config.hop_length;
        let pad = n_fft / 2;

        // Zero padding on both sides centers frame k on sample k * hop
        let mut padded = vec![0.0f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let num_frames = (padded.len() - n_fft) / hop + 1;
        let bins = n_fft / 2 + 1;
        let mut spectra = Array2::<f32>::zeros((bins, num_frames));

        let mut input = self.fft.make_input_vec();
        let mut output = self.fft.make_output_vec();

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop;
            let frame = &padded[start..start + n_fft];

            for ((dst, &sample), &w) in input.iter_mut().zip(frame).zip(&self.window) {
                *dst = sample * w;
            }

            self.fft.process(&mut input, &mut output)?;

            for (bin, c) in output.iter().enumerate() {
                spectra[[bin, frame_idx]] = c.norm_sqr();
            }
        }

        Ok(spectra)
    }
}

/// Apply Hann window function to reduce spectral leakage
fn apply_hann_window(samples: &mut [f32]) {
    let n = samples.len();

    if n == 0 {
        return;
    }

    for i in 0..n {
        let window_val = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
        samples[i] *= window_val;
    }
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above
fn hz_to_mel(hz: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;

    if hz >= min_log_hz {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    } else {
        hz / f_sp
    }
}

fn mel_to_hz(mel: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;

    if mel >= min_log_mel {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    } else {
        mel * f_sp
    }
}

/// Band edge/center frequencies: `bands + 2` points evenly spaced in mel
/// between 0 Hz and Nyquist
pub fn mel_frequencies(sample_rate: f32, bands: usize) -> Vec<f32> {
    let max_mel = hz_to_mel(sample_rate / 2.0);
    let points = bands + 2;

    (0..points)
        .map(|i| mel_to_hz(max_mel * i as f32 / (points - 1) as f32))
        .collect()
}

/// Triangular mel filters with Slaney area normalization
fn mel_filterbank(sample_rate: f32, n_fft: usize, bands: usize) -> Array2<f32> {
    let bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f32> = (0..bins)
        .map(|k| k as f32 * sample_rate / n_fft as f32)
        .collect();
    let mel_f = mel_frequencies(sample_rate, bands);

    let mut weights = Array2::<f32>::zeros((bands, bins));

    for band in 0..bands {
        let lower_width = mel_f[band + 1] - mel_f[band];
        let upper_width = mel_f[band + 2] - mel_f[band + 1];
        let enorm = 2.0 / (mel_f[band + 2] - mel_f[band]);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - mel_f[band]) / lower_width;
            let upper = (mel_f[band + 2] - freq) / upper_width;
            weights[[band, k]] = lower.min(upper).max(0.0) * enorm;
        }
    }

    weights
}

/// Convert a magnitude spectrogram to dB relative to 1.0
fn amplitude_to_db(spec: &Array2<f32>) -> Array2<f32> {
    let mut db = spec.mapv(|s| 20.0 * s.abs().max(AMPLITUDE_FLOOR).log10());

    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() {
        let floor = peak - TOP_DB;
        db.mapv_inplace(|v| v.max(floor));
    }

    db
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let mut samples = vec![1.0; 100];
        apply_hann_window(&mut samples);

        // Window should taper at edges
        assert!(samples[0] < 0.1);
        assert!(samples[99] < 0.1);
        assert!(samples[50] > 0.9); // Peak in middle
    }

    #[test]
    fn test_mel_scale_round_trip() {
        for hz in [0.0, 50.0, 250.0, 999.0, 1500.0, 8000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 0.05 * hz.max(1.0));
        }
    }

    #[test]
    fn test_output_shape() {
        let mel = MelSpectrogram::new(MelConfig::default()).unwrap();
        let db = mel.decibels(&sine(20.0, 500.0, 500)).unwrap();

        assert_eq!(db.nrows(), 64);
        assert_eq!(db.ncols(), 11);
        assert_eq!(MelConfig::default().num_frames(500), 11);
    }

    #[test]
    fn test_constant_signal_is_finite() {
        let mel = MelSpectrogram::new(MelConfig::default()).unwrap();

        for value in [0.0, 3.5] {
            let db = mel.decibels(&vec![value; 500]).unwrap();
            assert!(db.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_dynamic_range_is_clamped() {
        let mel = MelSpectrogram::new(MelConfig::default()).unwrap();
        let db = mel.decibels(&sine(60.0, 500.0, 500)).unwrap();

        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let low = db.iter().copied().fold(f32::INFINITY, f32::min);
        assert!(peak - low <= TOP_DB + 1e-3);
    }

    #[test]
    fn test_tone_peaks_in_matching_band() {
        let config = MelConfig::default();
        let mel = MelSpectrogram::new(config).unwrap();
        let power = mel.power(&sine(50.0, 500.0, 500)).unwrap();

        // Middle frame sees the full tone
        let frame = power.ncols() / 2;
        let (best_band, _) = power
            .column(frame)
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });

        let centers = mel_frequencies(config.sample_rate_hz as f32, config.bands);
        assert!((centers[best_band + 1] - 50.0).abs() < 5.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MelConfig {
            hop_length: 0,
            ..MelConfig::default()
        };
        assert!(MelSpectrogram::new(config).is_err());
    }
}
