// Linear support vector machine
// One-vs-one voting over binary hinge-loss models trained by dual coordinate descent

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::classify::backend::{
    check_training_set, distinct_classes, Classifier, ClassifierError, ClassifierResult,
};

/// Solver settings shared by every binary sub-problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    /// Soft-margin penalty
    pub c: f64,

    /// Maximum passes over the training samples
    pub max_iter: usize,

    /// Stop when the projected-gradient spread falls below this
    pub tol: f64,

    /// Seed for the per-pass sample order
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        SvmParams {
            c: 10.0,
            max_iter: 1000,
            tol: 1e-3,
            seed: 0,
        }
    }
}

/// Binary model separating `positive` (+1) from `negative` (-1)
#[derive(Debug, Clone)]
struct BinaryModel {
    positive: u8,
    negative: u8,
    /// Feature weights followed by the bias term
    weights: Vec<f64>,
}

impl BinaryModel {
    fn decision(&self, row: &[f64]) -> f64 {
        let (w, bias) = self.weights.split_at(row.len());
        dot(w, row) + bias[0]
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn rows_of(x: &DMatrix<f64>) -> Vec<Vec<f64>> {
    x.row_iter().map(|r| r.iter().copied().collect()).collect()
}

/// Dual coordinate descent for the L1-loss (hinge) linear SVM
/// Each sample is augmented with a constant 1 feature carrying the bias
fn train_binary(rows: &[&[f64]], signs: &[f64], params: &SvmParams, rng: &mut StdRng) -> (Vec<f64>, usize) {
    let d = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut w = vec![0.0; d + 1];
    let mut alpha = vec![0.0; rows.len()];
    let q_diag: Vec<f64> = rows.iter().map(|r| dot(r, r) + 1.0).collect();
    let mut order: Vec<usize> = (0..rows.len()).collect();

    let mut passes = 0;
    while passes < params.max_iter {
        passes += 1;
        order.shuffle(rng);

        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;

        for &i in &order {
            let row = rows[i];
            let y = signs[i];
            let g = y * (dot(&w[..d], row) + w[d]) - 1.0;

            let pg = if alpha[i] == 0.0 {
                g.min(0.0)
            } else if alpha[i] == params.c {
                g.max(0.0)
            } else {
                g
            };

            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > 1e-12 {
                let old = alpha[i];
                alpha[i] = (old - g / q_diag[i]).clamp(0.0, params.c);
                let step = (alpha[i] - old) * y;
                for (wj, xj) in w[..d].iter_mut().zip(row.iter()) {
                    *wj += step * xj;
                }
                w[d] += step;
            }
        }

        if pg_max - pg_min < params.tol {
            break;
        }
    }

    (w, passes)
}

/// Multi-class linear SVM, one binary model per class pair
#[derive(Debug, Clone)]
pub struct LinearSvm {
    params: SvmParams,
    classes: Vec<u8>,
    models: Vec<BinaryModel>,
    fitted: bool,
}

impl LinearSvm {
    pub fn new(params: SvmParams) -> Self {
        LinearSvm {
            params,
            classes: Vec::new(),
            models: Vec::new(),
            fitted: false,
        }
    }

    pub fn params(&self) -> &SvmParams {
        &self.params
    }

    /// Number of pairwise models, `k * (k - 1) / 2`
    pub fn num_models(&self) -> usize {
        self.models.len()
    }
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self::new(SvmParams::default())
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[u8]) -> ClassifierResult<()> {
        check_training_set(x, y)?;

        let rows = rows_of(x);
        let classes = distinct_classes(y);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut models = Vec::new();

        for (ai, &a) in classes.iter().enumerate() {
            for &b in &classes[ai + 1..] {
                let mut subset = Vec::new();
                let mut signs = Vec::new();
                for (row, &label) in rows.iter().zip(y) {
                    if label == a {
                        subset.push(row.as_slice());
                        signs.push(1.0);
                    } else if label == b {
                        subset.push(row.as_slice());
                        signs.push(-1.0);
                    }
                }

                let (weights, passes) = train_binary(&subset, &signs, &self.params, &mut rng);
                if passes >= self.params.max_iter {
                    log::debug!(
                        "SVM {} vs {} reached max_iter ({}) before converging",
                        a,
                        b,
                        self.params.max_iter
                    );
                }

                models.push(BinaryModel {
                    positive: a,
                    negative: b,
                    weights,
                });
            }
        }

        log::debug!(
            "SVM fitted: {} samples, {} classes, {} pairwise models",
            x.nrows(),
            classes.len(),
            models.len()
        );

        self.classes = classes;
        self.models = models;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> ClassifierResult<Vec<u8>> {
        if !self.fitted {
            return Err(ClassifierError::NotFitted);
        }
        if let Some(model) = self.models.first() {
            let expected = model.weights.len() - 1;
            if x.ncols() != expected {
                return Err(ClassifierError::FeatureMismatch {
                    expected,
                    actual: x.ncols(),
                });
            }
        }

        let predictions = rows_of(x)
            .iter()
            .map(|row| {
                let mut votes = vec![0usize; self.classes.len()];
                for model in &self.models {
                    let winner = if model.decision(row) > 0.0 {
                        model.positive
                    } else {
                        model.negative
                    };
                    let idx = self.classes.partition_point(|&c| c < winner);
                    votes[idx] += 1;
                }

                // Ties go to the lowest class label
                let mut best = 0;
                for (idx, &count) in votes.iter().enumerate() {
                    if count > votes[best] {
                        best = idx;
                    }
                }
                self.classes[best]
            })
            .collect();

        Ok(predictions)
    }

    fn name(&self) -> &'static str {
        "SVM"
    }
}
