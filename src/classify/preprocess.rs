// Feature preprocessing
// Standardization, PCA and the preprocessing-plus-classifier pipeline

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::classify::backend::{check_training_set, Classifier, ClassifierError, ClassifierResult};

/// Columns with smaller spread than this are left unscaled
const MIN_SCALE: f64 = 1e-12;

/// Learned transform applied ahead of a classifier
pub trait Preprocessor {
    fn fit(&mut self, x: &DMatrix<f64>) -> ClassifierResult<()>;

    fn transform(&self, x: &DMatrix<f64>) -> ClassifierResult<DMatrix<f64>>;

    fn fit_transform(&mut self, x: &DMatrix<f64>) -> ClassifierResult<DMatrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

fn check_width(expected: usize, x: &DMatrix<f64>) -> ClassifierResult<()> {
    if x.ncols() != expected {
        return Err(ClassifierError::FeatureMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

fn column_means(x: &DMatrix<f64>) -> DVector<f64> {
    let n = x.nrows().max(1) as f64;
    DVector::from_iterator(x.ncols(), x.column_iter().map(|c| c.sum() / n))
}

fn center(x: &DMatrix<f64>, mean: &DVector<f64>) -> DMatrix<f64> {
    let mut centered = x.clone();
    for (j, mut column) in centered.column_iter_mut().enumerate() {
        column.add_scalar_mut(-mean[j]);
    }
    centered
}

/// Zero mean, unit (population) variance per column
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<DVector<f64>>,
    scale: Option<DVector<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preprocessor for StandardScaler {
    fn fit(&mut self, x: &DMatrix<f64>) -> ClassifierResult<()> {
        if x.nrows() == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let n = x.nrows() as f64;
        let mean = column_means(x);
        let scale = DVector::from_iterator(
            x.ncols(),
            x.column_iter().enumerate().map(|(j, c)| {
                let var = c.iter().map(|v| (v - mean[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std < MIN_SCALE {
                    1.0
                } else {
                    std
                }
            }),
        );

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> ClassifierResult<DMatrix<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(ClassifierError::NotFitted);
        };
        check_width(mean.len(), x)?;

        let mut out = center(x, mean);
        for (j, mut column) in out.column_iter_mut().enumerate() {
            column /= scale[j];
        }
        Ok(out)
    }
}

/// Principal component projection keeping a target share of the variance
#[derive(Debug, Clone)]
pub struct Pca {
    variance_ratio: f64,
    mean: Option<DVector<f64>>,
    /// `[features x kept components]`
    components: Option<DMatrix<f64>>,
}

impl Pca {
    /// `variance_ratio` is the cumulative explained-variance target in (0, 1]
    pub fn new(variance_ratio: f64) -> Self {
        Pca {
            variance_ratio,
            mean: None,
            components: None,
        }
    }

    pub fn n_components(&self) -> Option<usize> {
        self.components.as_ref().map(|c| c.ncols())
    }
}

/// Eigenpairs sorted by descending eigenvalue
fn sorted_eigen(matrix: DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let dim = matrix.nrows();
    if dim == 0 {
        return (Vec::new(), DMatrix::zeros(0, 0));
    }

    let eigen = SymmetricEigen::new(matrix);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let values = order.iter().map(|&i| eigen.eigenvalues[i].max(0.0)).collect();
    let vectors = DMatrix::from_columns(
        &order
            .iter()
            .map(|&i| eigen.eigenvectors.column(i).into_owned())
            .collect::<Vec<_>>(),
    );
    (values, vectors)
}

/// Smallest count whose cumulative share of `values` reaches `target`
fn components_for_ratio(values: &[f64], target: f64) -> usize {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 1;
    }

    let mut cumulative = 0.0;
    for (i, v) in values.iter().enumerate() {
        cumulative += v / total;
        if cumulative + 1e-12 >= target {
            return i + 1;
        }
    }
    values.len().max(1)
}

impl Preprocessor for Pca {
    fn fit(&mut self, x: &DMatrix<f64>) -> ClassifierResult<()> {
        let (n, d) = x.shape();
        if n == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let mean = column_means(x);
        let xc = center(x, &mean);
        let denom = (n.max(2) - 1) as f64;

        // Eigendecompose whichever of X'X and XX' is smaller
        let (values, basis) = if d <= n {
            let cov = xc.transpose() * &xc / denom;
            sorted_eigen(cov)
        } else {
            let gram = &xc * xc.transpose() / denom;
            let (values, u) = sorted_eigen(gram);

            let mut basis = DMatrix::zeros(d, values.len());
            for (k, &lambda) in values.iter().enumerate() {
                if lambda <= MIN_SCALE {
                    continue;
                }
                let v = xc.transpose() * u.column(k) / (lambda * denom).sqrt();
                basis.set_column(k, &v);
            }
            (values, basis)
        };

        let keep = components_for_ratio(&values, self.variance_ratio).min(basis.ncols().max(1));
        let components = if basis.ncols() == 0 {
            DMatrix::zeros(d, 1)
        } else {
            basis.columns(0, keep).into_owned()
        };

        log::debug!("PCA kept {} of {} components", components.ncols(), values.len());

        self.mean = Some(mean);
        self.components = Some(components);
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> ClassifierResult<DMatrix<f64>> {
        let (Some(mean), Some(components)) = (&self.mean, &self.components) else {
            return Err(ClassifierError::NotFitted);
        };
        check_width(mean.len(), x)?;

        Ok(center(x, mean) * components)
    }
}

/// Preprocessing steps fitted in order, then a classifier on their output
pub struct Pipeline {
    steps: Vec<Box<dyn Preprocessor>>,
    classifier: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Preprocessor>>, classifier: Box<dyn Classifier>) -> Self {
        Pipeline { steps, classifier }
    }

    fn apply_steps(&self, x: &DMatrix<f64>) -> ClassifierResult<DMatrix<f64>> {
        let mut current = x.clone();
        for step in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

impl Classifier for Pipeline {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[u8]) -> ClassifierResult<()> {
        check_training_set(x, y)?;

        let mut current = x.clone();
        for step in self.steps.iter_mut() {
            current = step.fit_transform(&current)?;
        }
        self.classifier.fit(&current, y)
    }

    fn predict(&self, x: &DMatrix<f64>) -> ClassifierResult<Vec<u8>> {
        let transformed = self.apply_steps(x)?;
        self.classifier.predict(&transformed)
    }

    fn name(&self) -> &'static str {
        self.classifier.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_standardizes_columns() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0, 4.0, 5.0]);
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();

        let mean: f64 = out.column(0).sum() / 4.0;
        let var: f64 = out.column(0).iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);

        // Constant column is centered, not divided by zero
        assert!(out.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scaler_requires_fit() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&DMatrix::zeros(1, 2)),
            Err(ClassifierError::NotFitted)
        ));
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&DMatrix::from_element(3, 2, 1.0)).unwrap();
        assert!(matches!(
            scaler.transform(&DMatrix::zeros(1, 3)),
            Err(ClassifierError::FeatureMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_pca_single_dominant_direction() {
        // Column 0 carries nearly all the variance
        let x = DMatrix::from_fn(20, 3, |r, c| match c {
            0 => r as f64 * 10.0,
            1 => (r % 2) as f64 * 0.01,
            _ => 0.0,
        });
        let mut pca = Pca::new(0.95);
        let out = pca.fit_transform(&x).unwrap();

        assert_eq!(pca.n_components(), Some(1));
        assert_eq!(out.shape(), (20, 1));
    }

    #[test]
    fn test_pca_two_equal_directions() {
        // Two uncorrelated columns with equal variance
        let x = DMatrix::from_row_slice(
            4,
            2,
            &[1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, -1.0],
        );
        let mut pca = Pca::new(0.95);
        pca.fit(&x).unwrap();
        assert_eq!(pca.n_components(), Some(2));
    }

    #[test]
    fn test_pca_wide_matrix_uses_gram() {
        // More features than samples, rank 1 after centering
        let x = DMatrix::from_fn(3, 50, |r, c| r as f64 * (c as f64 + 1.0));
        let mut pca = Pca::new(0.95);
        let out = pca.fit_transform(&x).unwrap();

        assert_eq!(pca.n_components(), Some(1));
        // Projection preserves the spread of the samples along the direction
        let spread = (out[(2, 0)] - out[(0, 0)]).abs();
        let direct = (x.row(2) - x.row(0)).norm();
        assert!((spread - direct).abs() < 1e-6 * direct);
    }

    #[test]
    fn test_components_for_ratio() {
        assert_eq!(components_for_ratio(&[5.0, 3.0, 2.0], 0.5), 1);
        assert_eq!(components_for_ratio(&[5.0, 3.0, 2.0], 0.8), 2);
        assert_eq!(components_for_ratio(&[5.0, 3.0, 2.0], 0.95), 3);
        assert_eq!(components_for_ratio(&[0.0, 0.0], 0.95), 1);
    }
}
