// Linear discriminant analysis
// Shared-covariance Gaussian class model with linear decision scores

use nalgebra::{DMatrix, DVector};

use crate::classify::backend::{
    check_training_set, distinct_classes, Classifier, ClassifierError, ClassifierResult,
};

/// Diagonal loading relative to the mean within-class variance
const RIDGE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct LdaModel {
    classes: Vec<u8>,
    /// `[features x classes]`
    coef: DMatrix<f64>,
    intercept: DVector<f64>,
}

/// LDA with pooled within-class covariance and uniform class priors
#[derive(Debug, Clone, Default)]
pub struct LdaClassifier {
    model: Option<LdaModel>,
}

impl LdaClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> Option<&[u8]> {
        self.model.as_ref().map(|m| m.classes.as_slice())
    }
}

impl Classifier for LdaClassifier {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[u8]) -> ClassifierResult<()> {
        check_training_set(x, y)?;

        let (n, d) = x.shape();
        let classes = distinct_classes(y);
        let k = classes.len();

        // Class means, one column per class
        let mut means = DMatrix::<f64>::zeros(d, k);
        let mut counts = vec![0usize; k];
        for (row, label) in y.iter().enumerate() {
            let ci = classes.partition_point(|c| c < label);
            counts[ci] += 1;
            let mut column = means.column_mut(ci);
            column += x.row(row).transpose();
        }
        for (ci, &count) in counts.iter().enumerate() {
            let mut column = means.column_mut(ci);
            column /= count as f64;
        }

        // Pooled within-class scatter
        let mut residuals = x.clone();
        for (row, label) in y.iter().enumerate() {
            let ci = classes.partition_point(|c| c < label);
            let mut r = residuals.row_mut(row);
            r -= means.column(ci).transpose();
        }
        let dof = if n > k { (n - k) as f64 } else { 1.0 };
        let mut sigma = residuals.transpose() * &residuals / dof;

        let ridge = RIDGE * (sigma.trace() / d.max(1) as f64) + f64::EPSILON;
        for i in 0..d {
            sigma[(i, i)] += ridge;
        }

        let coef = match sigma.clone().cholesky() {
            Some(chol) => chol.solve(&means),
            None => {
                let inverse = sigma.try_inverse().ok_or_else(|| {
                    ClassifierError::LinearAlgebra("within-class covariance is singular".into())
                })?;
                inverse * &means
            }
        };

        let log_prior = -(k as f64).ln();
        let intercept = DVector::from_iterator(
            k,
            (0..k).map(|ci| -0.5 * means.column(ci).dot(&coef.column(ci)) + log_prior),
        );

        log::debug!("LDA fitted: {} samples, {} features, {} classes", n, d, k);

        self.model = Some(LdaModel {
            classes,
            coef,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> ClassifierResult<Vec<u8>> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != model.coef.nrows() {
            return Err(ClassifierError::FeatureMismatch {
                expected: model.coef.nrows(),
                actual: x.ncols(),
            });
        }

        let scores = x * &model.coef;
        let predictions = scores
            .row_iter()
            .map(|row| {
                let mut best = 0;
                let mut best_score = f64::NEG_INFINITY;
                for (ci, score) in row.iter().enumerate() {
                    let total = score + model.intercept[ci];
                    if total > best_score {
                        best_score = total;
                        best = ci;
                    }
                }
                model.classes[best]
            })
            .collect();

        Ok(predictions)
    }

    fn name(&self) -> &'static str {
        "LDA"
    }
}
