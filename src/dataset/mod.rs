// Dataset module
// Example store construction, retrieval transforms and checkpoints

pub mod builder;
pub mod checkpoint;
pub mod store;
pub mod transforms;

pub use builder::{build_dataset, DatasetBuilder, DatasetError, TrialBatch};
pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointError};
pub use store::{Example, ExampleStore, RetrievalTransform, StoreError};
pub use transforms::{ByteQuantize, MinMaxScale, TransformKind};
