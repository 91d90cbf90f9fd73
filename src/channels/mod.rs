// Channel selection module
// Header descriptors and laterality/modality-based column selection

pub mod descriptor;
pub mod selector;

pub use descriptor::{Axis, ChannelDescriptor, ChannelKind, Muscle, Site};
pub use selector::{ChannelSelector, LateralityMode, Modality, ModalitySet};
