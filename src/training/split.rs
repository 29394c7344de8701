//! Stratified train/test split

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row indices of the two partitions, each in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Materialise `(x_train, x_test, y_train, y_test)`
    pub fn apply(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
        (
            x.select(Axis(0), &self.train),
            x.select(Axis(0), &self.test),
            y.select(Axis(0), &self.train),
            y.select(Axis(0), &self.test),
        )
    }
}

/// Splits rows so every class keeps its share in both partitions
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_size: f64,
    seed: u64,
}

impl StratifiedSplit {
    pub fn new(test_size: f64, seed: u64) -> Self {
        Self { test_size, seed }
    }

    /// Shuffle each class with the seeded generator and hold out
    /// `round(n_class * test_size)` of it, keeping at least one row of every
    /// class on each side.
    pub fn split(&self, y: &Array1<f64>) -> Result<TrainTestSplit> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::invalid_parameter(
                "test_size",
                self.test_size,
                "must be strictly between 0 and 1",
            ));
        }

        let mut classes: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            classes.entry(label.round() as i64).or_default().push(i);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(y.len());
        let mut test = Vec::new();

        for (class, mut indices) in classes {
            let n_class = indices.len();
            if n_class < 2 {
                return Err(PipelineError::DataError(format!(
                    "class {} has {} sample(s); stratified split needs at least 2",
                    class, n_class
                )));
            }
            indices.shuffle(&mut rng);

            let n_test = ((n_class as f64) * self.test_size).round() as usize;
            let n_test = n_test.clamp(1, n_class - 1);
            test.extend_from_slice(&indices[..n_test]);
            train.extend_from_slice(&indices[n_test..]);
        }

        train.sort_unstable();
        test.sort_unstable();
        Ok(TrainTestSplit { train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize, positives: usize) -> Array1<f64> {
        Array1::from_shape_fn(n, |i| if i % (n / positives) == 0 { 1.0 } else { 0.0 })
    }

    #[test]
    fn test_split_preserves_ratio() {
        let y = labels(100, 20);
        let split = StratifiedSplit::new(0.2, 42).split(&y).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let test_pos = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        let train_pos = split.train.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_pos, 4);
        assert_eq!(train_pos, 16);
    }

    #[test]
    fn test_split_is_reproducible() {
        let y = labels(50, 10);
        let a = StratifiedSplit::new(0.2, 7).split(&y).unwrap();
        let b = StratifiedSplit::new(0.2, 7).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let y = labels(30, 6);
        let split = StratifiedSplit::new(0.3, 1).split(&y).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_singleton_class_rejected() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0]);
        assert!(StratifiedSplit::new(0.2, 0).split(&y).is_err());
    }

    #[test]
    fn test_apply_shapes() {
        let x = Array2::from_shape_fn((10, 3), |(i, j)| (i * 3 + j) as f64);
        let y = labels(10, 5);
        let split = StratifiedSplit::new(0.2, 3).split(&y).unwrap();
        let (x_train, x_test, y_train, y_test) = split.apply(&x, &y);
        assert_eq!(x_train.nrows(), y_train.len());
        assert_eq!(x_test.nrows(), y_test.len());
        assert_eq!(x_train.nrows() + x_test.nrows(), 10);
    }
}
