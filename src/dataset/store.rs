// Example store
// Indexed collection of labeled feature tensors with an optional retrieval transform

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

use crate::events::SampleType;
use crate::features::FeatureTensor;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Example index {index} out of range for store of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One labeled example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub feature: FeatureTensor,
    pub label: u8,
    pub sample_type: SampleType,
}

/// Transform applied to a feature when it is read back out of the store
pub trait RetrievalTransform: Debug + Send + Sync {
    fn apply(&self, feature: &FeatureTensor) -> FeatureTensor;

    fn name(&self) -> &'static str;
}

/// Append-only example store
///
/// Indices are stable once assigned; the stored features are never
/// modified by the retrieval transform.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExampleStore {
    examples: Vec<Example>,

    #[serde(skip)]
    transform: Option<Box<dyn RetrievalTransform>>,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transform(mut self, transform: Box<dyn RetrievalTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn set_transform(&mut self, transform: Box<dyn RetrievalTransform>) {
        log::debug!("Store retrieval transform set to {}", transform.name());
        self.transform = Some(transform);
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Feature (after the retrieval transform, if any) and label at `index`
    pub fn get(&self, index: usize) -> Result<(FeatureTensor, u8), StoreError> {
        let example = self.get_example(index)?;
        let feature = match &self.transform {
            Some(transform) => transform.apply(&example.feature),
            None => example.feature.clone(),
        };
        Ok((feature, example.label))
    }

    /// Untransformed example at `index`
    pub fn get_example(&self, index: usize) -> Result<&Example, StoreError> {
        self.examples.get(index).ok_or(StoreError::IndexOutOfRange {
            index,
            len: self.examples.len(),
        })
    }

    pub fn push(&mut self, example: Example) {
        self.examples.push(example);
    }

    /// Append a batch in order; returns the number appended
    pub fn append_batch(&mut self, batch: Vec<Example>) -> usize {
        let count = batch.len();
        self.examples.extend(batch);
        count
    }

    pub fn labels(&self) -> Vec<u8> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn sample_types(&self) -> Vec<SampleType> {
        self.examples.iter().map(|e| e.sample_type).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter()
    }
}
