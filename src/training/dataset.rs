//! Training samples, normalization and batching

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::schema::FEATURE_DIM;
use crate::features::TrainingMatrix;

/// Z-score normalization for feature columns, fitted on the training partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    /// Smallest standard deviation used; constant columns normalize to 0
    pub const MIN_STD: f32 = 0.001;

    pub fn from_matrix(matrix: &TrainingMatrix) -> Self {
        let mut sum = vec![0.0f64; FEATURE_DIM];
        let mut sum_sq = vec![0.0f64; FEATURE_DIM];

        for row in matrix.rows() {
            for j in 0..FEATURE_DIM {
                let v = row[j] as f64;
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = matrix.len().max(1) as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| ((sq / n - m * m).max(0.0).sqrt() as f32).max(Self::MIN_STD))
            .collect();

        FeatureNormalization {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        }
    }

    pub fn normalize(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

/// Per-class sample weights, inversely proportional to class frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassWeights {
    pub win: f32,
    pub loss: f32,
}

impl ClassWeights {
    /// `n_samples / (n_classes * n_class_samples)` for each class present
    pub fn balanced(labels: &[u8]) -> Self {
        let wins = labels.iter().filter(|&&l| l == 1).count();
        let losses = labels.len() - wins;
        let classes = usize::from(wins > 0) + usize::from(losses > 0);

        let weight = |count: usize| {
            if count == 0 {
                0.0
            } else {
                labels.len() as f32 / (classes * count) as f32
            }
        };

        ClassWeights {
            win: weight(wins),
            loss: weight(losses),
        }
    }

    pub fn for_label(&self, label: u8) -> f32 {
        if label == 1 {
            self.win
        } else {
            self.loss
        }
    }
}

/// A single normalized training example
#[derive(Debug, Clone)]
pub struct GameSample {
    pub features: Vec<f32>,
    pub label: f32,
    pub weight: f32,
}

/// Build normalized, weighted samples from a training partition
pub fn samples(
    matrix: &TrainingMatrix,
    norm: &FeatureNormalization,
    weights: &ClassWeights,
) -> Vec<GameSample> {
    matrix
        .rows()
        .iter()
        .zip(matrix.labels())
        .map(|(row, &label)| GameSample {
            features: norm.normalize(row),
            label: if label == 1 { 1.0 } else { 0.0 },
            weight: weights.for_label(label),
        })
        .collect()
}

/// Batch of samples as tensors
#[derive(Debug, Clone)]
pub struct GameBatch<B: Backend> {
    /// [batch, FEATURE_DIM]
    pub features: Tensor<B, 2>,
    /// [batch, 1]
    pub labels: Tensor<B, 2>,
    /// [batch, 1]
    pub weights: Tensor<B, 2>,
}

impl<B: Backend> GameBatch<B> {
    pub fn from_samples(items: &[GameSample], device: &B::Device) -> Self {
        let batch_size = items.len();

        let mut feature_data = Vec::with_capacity(batch_size * FEATURE_DIM);
        let mut label_data = Vec::with_capacity(batch_size);
        let mut weight_data = Vec::with_capacity(batch_size);

        for sample in items {
            feature_data.extend_from_slice(&sample.features);
            label_data.push(sample.label);
            weight_data.push(sample.weight);
        }

        let features = Tensor::<B, 1>::from_floats(feature_data.as_slice(), device)
            .reshape([batch_size, FEATURE_DIM]);
        let labels =
            Tensor::<B, 1>::from_floats(label_data.as_slice(), device).reshape([batch_size, 1]);
        let weights =
            Tensor::<B, 1>::from_floats(weight_data.as_slice(), device).reshape([batch_size, 1]);

        GameBatch {
            features,
            labels,
            weights,
        }
    }
}
