// Gait event module
// Event detection from sparse marker columns and label derivation

pub mod extractor;
pub mod types;

pub use extractor::extract_events;
pub use types::{GaitEvent, GaitMarker, LabelScheme, Laterality, SampleType, TriggerCode};
