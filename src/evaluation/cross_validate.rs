// Cross-validated training and evaluation
// Fits a fresh classifier per fold and scores its held-out predictions

use nalgebra::DMatrix;

use crate::classify::build_classifier;
use crate::config::EvaluationConfig;
use crate::dataset::ExampleStore;
use crate::evaluation::folds::KFold;
use crate::evaluation::metrics::{EvaluationReport, FoldResult, FoldScores, SubsetAccuracy};
use crate::evaluation::EvaluationError;

/// Flattened feature vector of every example, one row each
pub fn feature_matrix(store: &ExampleStore) -> Result<DMatrix<f64>, EvaluationError> {
    if store.is_empty() {
        return Err(EvaluationError::EmptyStore);
    }

    let mut rows = Vec::with_capacity(store.len());
    for index in 0..store.len() {
        let (feature, _) = store.get(index)?;
        rows.push(feature.flatten());
    }

    let width = rows[0].len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(EvaluationError::InconsistentFeatureLength {
            index,
            expected: width,
            actual: row.len(),
        });
    }

    Ok(DMatrix::from_fn(rows.len(), width, |r, c| rows[r][c] as f64))
}

fn describe(accuracy: &SubsetAccuracy) -> String {
    match accuracy {
        SubsetAccuracy::Defined { correct, total } => {
            format!("{}/{} ({:.4})", correct, total, *correct as f64 / *total as f64)
        }
        SubsetAccuracy::Undefined => "undefined".to_string(),
    }
}

fn select_rows(x: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(indices.len(), x.ncols(), |r, c| x[(indices[r], c)])
}

/// Run k-fold cross-validation over the whole store
pub fn cross_validate(
    store: &ExampleStore,
    config: &EvaluationConfig,
) -> Result<EvaluationReport, EvaluationError> {
    let x = feature_matrix(store)?;
    let labels = store.labels();
    let sample_types = store.sample_types();

    let splits = KFold::new(config.folds, config.seed).split(store.len())?;
    let mut folds = Vec::with_capacity(splits.len());

    log::info!(
        "Cross-validating {} on {} examples x {} features, {} folds",
        config.classifier,
        x.nrows(),
        x.ncols(),
        splits.len()
    );

    for split in &splits {
        let x_train = select_rows(&x, &split.train);
        let y_train: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
        let x_test = select_rows(&x, &split.test);
        let y_test: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();
        let test_types: Vec<_> = split.test.iter().map(|&i| sample_types[i]).collect();

        let mut model = build_classifier(config.classifier, config);
        model.fit(&x_train, &y_train)?;
        let predicted = model.predict(&x_test)?;

        let scores = FoldScores::score(&predicted, &y_test, &test_types);
        log::info!(
            "Fold {}: overall {}, steady-state {}, transitional {}",
            split.fold,
            describe(&scores.overall),
            describe(&scores.steady_state),
            describe(&scores.transitional)
        );

        folds.push(FoldResult {
            fold: split.fold,
            train_size: split.train.len(),
            test_size: split.test.len(),
            scores,
        });
    }

    Ok(EvaluationReport { folds })
}
