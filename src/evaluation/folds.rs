// K-fold partitioning
// Seeded shuffled split of example indices into disjoint test folds

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::evaluation::EvaluationError;

/// Train/test indices of one fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold: usize,
    /// Ascending
    pub train: Vec<usize>,
    /// In shuffled order
    pub test: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for KFold {
    fn default() -> Self {
        KFold {
            n_splits: 10,
            shuffle: true,
            seed: 0,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        KFold {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    /// Partition `0..n` into `n_splits` folds
    ///
    /// The first `n % n_splits` folds hold one extra test index. Every
    /// index lands in exactly one test fold.
    pub fn split(&self, n: usize) -> Result<Vec<FoldSplit>, EvaluationError> {
        if self.n_splits < 2 {
            return Err(EvaluationError::InvalidFolds(self.n_splits));
        }
        if n < self.n_splits {
            return Err(EvaluationError::TooFewExamples {
                examples: n,
                folds: self.n_splits,
            });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        let base = n / self.n_splits;
        let extra = n % self.n_splits;
        let mut splits = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let test = indices[start..start + size].to_vec();

            let mut in_test = vec![false; n];
            for &i in &test {
                in_test[i] = true;
            }
            let train = (0..n).filter(|&i| !in_test[i]).collect();

            splits.push(FoldSplit { fold, train, test });
            start += size;
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_cover_every_index_once() {
        let splits = KFold::new(5, 3).split(100).unwrap();
        assert_eq!(splits.len(), 5);

        let mut seen = vec![0usize; 100];
        for split in &splits {
            assert_eq!(split.test.len(), 20);
            assert_eq!(split.train.len(), 80);
            for &i in &split.test {
                seen[i] += 1;
                assert!(!split.train.contains(&i));
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_uneven_fold_sizes() {
        let splits = KFold::new(3, 0).split(10).unwrap();
        let sizes: Vec<usize> = splits.iter().map(|s| s.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_same_seed_same_splits() {
        let a = KFold::new(4, 11).split(37).unwrap();
        let b = KFold::new(4, 11).split(37).unwrap();
        let c = KFold::new(4, 12).split(37).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unshuffled_is_contiguous() {
        let kfold = KFold {
            n_splits: 2,
            shuffle: false,
            seed: 0,
        };
        let splits = kfold.split(4).unwrap();
        assert_eq!(splits[0].test, vec![0, 1]);
        assert_eq!(splits[1].train, vec![0, 1]);
    }

    #[test]
    fn test_too_few_examples() {
        assert!(matches!(
            KFold::new(10, 0).split(9),
            Err(EvaluationError::TooFewExamples { examples: 9, folds: 10 })
        ));
    }
}
