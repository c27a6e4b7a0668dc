//! Class-balanced logistic classifier
//!
//! Trained with burn as a single `Linear` layer behind a sigmoid, full batch,
//! plain SGD from zero weights. Once fitted the parameters are copied out so
//! scoring, holdout evaluation and snapshots share one code path.

use burn::nn::{Initializer, Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use serde::{Deserialize, Serialize};

use super::dataset::{samples, ClassWeights, FeatureNormalization, GameBatch};
use crate::features::schema::FEATURE_DIM;
use crate::features::TrainingMatrix;
use crate::{NbaError, Result};

/// Default backend for in-request training
pub type TrainingBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

/// A fitted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
    pub weights: Vec<f32>,
    pub bias: f32,
    pub norm: FeatureNormalization,
}

impl Classifier {
    fn check_width(&self, features: &[f32]) -> Result<()> {
        if features.len() != self.weights.len() {
            return Err(NbaError::Data(format!(
                "input vector has {} columns, model expects {}",
                features.len(),
                self.weights.len()
            )));
        }
        Ok(())
    }

    /// Raw score; positive means class 1
    pub fn decision(&self, features: &[f32]) -> Result<f32> {
        self.check_width(features)?;
        let z = self
            .norm
            .normalize(features)
            .iter()
            .zip(self.weights.iter())
            .map(|(x, w)| x * w)
            .sum::<f32>()
            + self.bias;
        if z.is_nan() {
            return Err(NbaError::Data(
                "model produced no score for the input vector".to_string(),
            ));
        }
        Ok(z)
    }

    /// Probability of class 1, clipped to [0, 1]
    pub fn predict_proba(&self, features: &[f32]) -> Result<f32> {
        let z = self.decision(features)?;
        Ok((1.0 / (1.0 + (-z).exp())).clamp(0.0, 1.0))
    }

    /// Hard class: 1 if the decision score is positive, else 0
    pub fn predict(&self, features: &[f32]) -> Result<u8> {
        Ok(u8::from(self.decision(features)? > 0.0))
    }
}

/// Fits a `Classifier` with burn
pub struct LogisticTrainer<B: AutodiffBackend> {
    model: Linear<B>,
    learning_rate: f64,
    epochs: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> LogisticTrainer<B> {
    pub fn new(device: B::Device, learning_rate: f64, epochs: usize) -> Self {
        let model = LinearConfig::new(FEATURE_DIM, 1)
            .with_initializer(Initializer::Zeros)
            .init(&device);

        LogisticTrainer {
            model,
            learning_rate,
            epochs,
            device,
        }
    }

    /// Train on `train` with balanced class weights
    pub fn fit(mut self, train: &TrainingMatrix) -> Result<Classifier> {
        if train.is_empty() {
            return Err(NbaError::Data("training partition is empty".to_string()));
        }

        let norm = FeatureNormalization::from_matrix(train);
        let class_weights = ClassWeights::balanced(train.labels());
        log::debug!(
            "Class weights: win={:.3}, loss={:.3}",
            class_weights.win,
            class_weights.loss
        );

        let items = samples(train, &norm, &class_weights);
        let batch = GameBatch::<B>::from_samples(&items, &self.device);
        let mut optimizer = SgdConfig::new().init::<B, Linear<B>>();

        for epoch in 0..self.epochs {
            let logits = self.model.forward(batch.features.clone());
            let loss = weighted_binary_cross_entropy(
                logits,
                batch.labels.clone(),
                batch.weights.clone(),
            );
            let loss_val: f32 = loss.clone().into_scalar().elem();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = optimizer.step(self.learning_rate, self.model, grads);

            if epoch % 50 == 0 || epoch + 1 == self.epochs {
                log::debug!("Epoch {}/{}: loss={:.4}", epoch + 1, self.epochs, loss_val);
            }
        }

        self.into_classifier(norm)
    }

    fn into_classifier(self, norm: FeatureNormalization) -> Result<Classifier> {
        let weights = self
            .model
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| NbaError::Data(format!("failed to read model weights: {:?}", e)))?;

        let bias = match &self.model.bias {
            Some(b) => b
                .val()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| NbaError::Data(format!("failed to read model bias: {:?}", e)))?
                .first()
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        };

        Ok(Classifier {
            weights,
            bias,
            norm,
        })
    }
}

/// Mean of per-sample weighted BCE
fn weighted_binary_cross_entropy<B: AutodiffBackend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let probs = sigmoid(logits);
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    (loss * weights).mean()
}
