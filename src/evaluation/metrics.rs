// Accuracy metrics
// Per-fold overall / steady-state / transitional accuracy and their aggregation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::SampleType;

/// Accuracy over a sub-population that may be empty in a fold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsetAccuracy {
    Defined { correct: usize, total: usize },
    Undefined,
}

impl SubsetAccuracy {
    pub fn from_counts(correct: usize, total: usize) -> Self {
        if total == 0 {
            SubsetAccuracy::Undefined
        } else {
            SubsetAccuracy::Defined { correct, total }
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            SubsetAccuracy::Defined { correct, total } => Some(*correct as f64 / *total as f64),
            SubsetAccuracy::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, SubsetAccuracy::Defined { .. })
    }
}

impl fmt::Display for SubsetAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("undefined"),
        }
    }
}

/// Scores of one evaluated fold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldScores {
    pub overall: SubsetAccuracy,
    pub steady_state: SubsetAccuracy,
    pub transitional: SubsetAccuracy,
}

impl FoldScores {
    /// Score predictions against truth, split by sample type
    pub fn score(predicted: &[u8], truth: &[u8], sample_types: &[SampleType]) -> Self {
        let mut correct = [0usize; 2];
        let mut total = [0usize; 2];

        for ((p, t), st) in predicted.iter().zip(truth).zip(sample_types) {
            let slot = if st.is_steady_state() { 0 } else { 1 };
            total[slot] += 1;
            if p == t {
                correct[slot] += 1;
            }
        }

        FoldScores {
            overall: SubsetAccuracy::from_counts(correct[0] + correct[1], total[0] + total[1]),
            steady_state: SubsetAccuracy::from_counts(correct[0], total[0]),
            transitional: SubsetAccuracy::from_counts(correct[1], total[1]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub scores: FoldScores,
}

/// Mean and population standard deviation over the defined folds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// `None` when no fold was defined
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub defined: usize,
    pub undefined: usize,
}

impl AccuracySummary {
    pub fn from_folds<'a>(values: impl IntoIterator<Item = &'a SubsetAccuracy>) -> Self {
        let mut defined = Vec::new();
        let mut undefined = 0;
        for v in values {
            match v.value() {
                Some(x) => defined.push(x),
                None => undefined += 1,
            }
        }

        if defined.is_empty() {
            return AccuracySummary {
                mean: None,
                std: None,
                defined: 0,
                undefined,
            };
        }

        let n = defined.len() as f64;
        let mean = defined.iter().sum::<f64>() / n;
        let var = defined.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        AccuracySummary {
            mean: Some(mean),
            std: Some(var.sqrt()),
            defined: defined.len(),
            undefined,
        }
    }
}

impl fmt::Display for AccuracySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean, self.std) {
            (Some(mean), Some(std)) => write!(
                f,
                "mean {:.4} std {:.4} over {} folds",
                mean, std, self.defined
            ),
            _ => f.write_str("undefined"),
        }
    }
}

/// All fold results of one cross-validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub folds: Vec<FoldResult>,
}

impl EvaluationReport {
    pub fn overall(&self) -> Vec<SubsetAccuracy> {
        self.folds.iter().map(|f| f.scores.overall).collect()
    }

    pub fn steady_state(&self) -> Vec<SubsetAccuracy> {
        self.folds.iter().map(|f| f.scores.steady_state).collect()
    }

    pub fn transitional(&self) -> Vec<SubsetAccuracy> {
        self.folds.iter().map(|f| f.scores.transitional).collect()
    }

    pub fn overall_summary(&self) -> AccuracySummary {
        AccuracySummary::from_folds(&self.overall())
    }

    pub fn steady_state_summary(&self) -> AccuracySummary {
        AccuracySummary::from_folds(&self.steady_state())
    }

    pub fn transitional_summary(&self) -> AccuracySummary {
        AccuracySummary::from_folds(&self.transitional())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_scores_split_by_sample_type() {
        let truth = [0, 1, 2, 3];
        let predicted = [0, 1, 0, 0];
        let types = [
            SampleType::SteadyState,
            SampleType::Transitional,
            SampleType::SteadyState,
            SampleType::Transitional,
        ];

        let scores = FoldScores::score(&predicted, &truth, &types);
        assert_eq!(scores.overall.value(), Some(0.5));
        assert_eq!(scores.steady_state.value(), Some(0.5));
        assert_eq!(scores.transitional.value(), Some(0.5));
    }

    #[test]
    fn test_empty_subset_is_undefined() {
        let scores = FoldScores::score(&[1, 1], &[1, 2], &[SampleType::SteadyState; 2]);
        assert_eq!(scores.transitional, SubsetAccuracy::Undefined);
        assert_eq!(scores.steady_state.value(), Some(0.5));
        assert_eq!(scores.transitional.to_string(), "undefined");
    }

    #[test]
    fn test_summary_skips_undefined_folds() {
        let mut folds = vec![SubsetAccuracy::Defined { correct: 1, total: 2 }; 4];
        folds.extend(vec![SubsetAccuracy::Defined { correct: 1, total: 1 }; 4]);
        folds.push(SubsetAccuracy::Undefined);
        folds.push(SubsetAccuracy::Undefined);

        let summary = AccuracySummary::from_folds(&folds);
        assert_eq!(summary.defined, 8);
        assert_eq!(summary.undefined, 2);
        assert!((summary.mean.unwrap() - 0.75).abs() < 1e-12);
        assert!((summary.std.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_all_undefined_stays_undefined() {
        let summary = AccuracySummary::from_folds(&[SubsetAccuracy::Undefined; 3]);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.std, None);
        assert_eq!(summary.to_string(), "undefined");
    }
}
