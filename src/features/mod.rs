// Feature extraction module
// Event windows, mel spectrograms, and feature tensors

pub mod spectrogram;
pub mod transform;
pub mod window;

pub use spectrogram::{MelConfig, MelSpectrogram, SpectrogramError};
pub use transform::{FeatureTensor, FeatureTransformer, Representation};
pub use window::{extract_window, window_bounds, Window};
