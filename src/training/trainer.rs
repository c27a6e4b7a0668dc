//! Split, fit and evaluate

use super::classifier::{Classifier, LogisticTrainer, TrainingBackend};
use super::metrics::Metrics;
use super::split::HoldoutSplit;
use crate::features::TrainingMatrix;
use crate::{NbaError, Result, TrainingConfig};

/// A fitted classifier together with its holdout accuracy
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub classifier: Classifier,
    pub accuracy: f64,
}

/// Fits a fresh classifier for one training matrix
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Trainer { config }
    }

    /// Hold out a seeded fraction of rows, fit on the rest, report holdout accuracy
    pub fn train(&self, matrix: &TrainingMatrix) -> Result<TrainedModel> {
        if matrix.class_count() < 2 {
            return Err(NbaError::Data(
                "insufficient class diversity to train".to_string(),
            ));
        }

        let split = HoldoutSplit::new(matrix.len(), self.config.holdout_fraction, self.config.seed);
        let (train, holdout) = split.apply(matrix);

        let classifier = LogisticTrainer::<TrainingBackend>::new(
            Default::default(),
            self.config.learning_rate,
            self.config.epochs,
        )
        .fit(&train)?;

        let metrics = Metrics::evaluate(&classifier, &holdout)?;
        log::info!(
            "Trained on {} games, holdout {}: {}",
            train.len(),
            holdout.len(),
            metrics
        );

        Ok(TrainedModel {
            classifier,
            accuracy: metrics.accuracy(),
        })
    }
}
