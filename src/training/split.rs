//! Seeded train/holdout split

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::features::TrainingMatrix;

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutSplit {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

impl HoldoutSplit {
    /// Shuffle `0..n` with `seed`; the first `ceil(n * fraction)` rows are held out.
    /// At least one row stays on each side when `n >= 2`.
    pub fn new(n: usize, holdout_fraction: f32, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        // f32 fractions are slightly above their decimal value (0.2 -> 0.2000000030)
        let mut n_holdout = (n as f64 * holdout_fraction as f64 - 1e-6).ceil().max(0.0) as usize;
        if n >= 2 {
            n_holdout = n_holdout.clamp(1, n - 1);
        } else {
            n_holdout = 0;
        }

        let train = indices.split_off(n_holdout);
        log::debug!("Split {} rows: train={}, holdout={}", n, train.len(), indices.len());

        HoldoutSplit {
            train,
            holdout: indices,
        }
    }

    /// Apply the split to a matrix
    pub fn apply(&self, matrix: &TrainingMatrix) -> (TrainingMatrix, TrainingMatrix) {
        (matrix.select(&self.train), matrix.select(&self.holdout))
    }
}
