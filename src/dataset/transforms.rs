// Retrieval transforms
// Image-style rescaling applied when examples are read from the store

use serde::{Deserialize, Serialize};

use crate::dataset::store::RetrievalTransform;
use crate::features::FeatureTensor;

/// Rescale every value of a feature linearly into `[0, max]`
/// A constant feature maps to all zeros
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScale {
    pub max: f32,
}

impl Default for MinMaxScale {
    fn default() -> Self {
        MinMaxScale { max: 1.0 }
    }
}

impl RetrievalTransform for MinMaxScale {
    fn apply(&self, feature: &FeatureTensor) -> FeatureTensor {
        let Some((lo, hi)) = feature.value_range() else {
            return feature.clone();
        };

        let span = hi - lo;
        if span <= f32::EPSILON {
            return feature.map_values(|_| 0.0);
        }

        let max = self.max;
        feature.map_values(|v| (v - lo) / span * max)
    }

    fn name(&self) -> &'static str {
        "min_max_scale"
    }
}

/// Rescale into `[0, 255]` then round to whole byte values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ByteQuantize;

impl RetrievalTransform for ByteQuantize {
    fn apply(&self, feature: &FeatureTensor) -> FeatureTensor {
        MinMaxScale { max: 255.0 }
            .apply(feature)
            .map_values(|v| v.round().clamp(0.0, 255.0))
    }

    fn name(&self) -> &'static str {
        "byte_quantize"
    }
}

fn default_scale_max() -> f32 {
    1.0
}

/// Serializable choice of retrieval transform, e.g.
/// `{ "kind": "min_max_scale", "max": 1.0 }` or `{ "kind": "byte_quantize" }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformKind {
    MinMaxScale {
        #[serde(default = "default_scale_max")]
        max: f32,
    },
    ByteQuantize,
}

impl TransformKind {
    pub fn build(self) -> Box<dyn RetrievalTransform> {
        match self {
            TransformKind::MinMaxScale { max } => Box::new(MinMaxScale { max }),
            TransformKind::ByteQuantize => Box::new(ByteQuantize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn tensor(values: Vec<f32>) -> FeatureTensor {
        FeatureTensor::TimeSeries(Array2::from_shape_vec((1, values.len()), values).unwrap())
    }

    #[test]
    fn test_min_max_scale() {
        let scaled = MinMaxScale { max: 2.0 }.apply(&tensor(vec![-1.0, 0.0, 3.0]));
        assert_eq!(scaled.flatten(), vec![0.0, 0.5, 2.0]);
    }

    #[test]
    fn test_constant_feature_maps_to_zero() {
        let scaled = MinMaxScale::default().apply(&tensor(vec![7.0, 7.0, 7.0]));
        assert_eq!(scaled.flatten(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_byte_quantize() {
        let quantized = ByteQuantize.apply(&tensor(vec![0.0, 1.0, 2.0, 4.0]));
        assert_eq!(quantized.flatten(), vec![0.0, 64.0, 128.0, 255.0]);
    }

    #[test]
    fn test_spectrogram_is_scaled_jointly() {
        let feature = FeatureTensor::Spectrogram(vec![
            Array2::from_elem((2, 2), -80.0),
            Array2::from_elem((2, 2), 0.0),
        ]);
        let scaled = MinMaxScale::default().apply(&feature);

        let values = scaled.flatten();
        assert!(values[..4].iter().all(|&v| v == 0.0));
        assert!(values[4..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_transform_kind_from_json() {
        let kind: TransformKind = serde_json::from_str(r#"{ "kind": "min_max_scale" }"#).unwrap();
        assert_eq!(kind, TransformKind::MinMaxScale { max: 1.0 });
        assert_eq!(kind.build().name(), "min_max_scale");

        let kind: TransformKind = serde_json::from_str(r#"{ "kind": "byte_quantize" }"#).unwrap();
        let quantized = kind.build().apply(&tensor(vec![0.0, 2.0]));
        assert_eq!(quantized.flatten(), vec![0.0, 255.0]);
    }
}
