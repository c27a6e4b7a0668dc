//! Evaluation metrics

use std::fmt;

use super::classifier::Classifier;
use crate::features::TrainingMatrix;
use crate::Result;

/// Prediction counts over an evaluation set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    /// Number of correct hard predictions
    pub correct: usize,
    /// Total predictions
    pub total: usize,
    /// Summed absolute error between predicted probability and label
    pub abs_error_sum: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score every row of `matrix` with `model`
    pub fn evaluate(model: &Classifier, matrix: &TrainingMatrix) -> Result<Self> {
        let mut metrics = Metrics::new();
        for (row, &label) in matrix.rows().iter().zip(matrix.labels()) {
            let predicted = model.predict(row)?;
            let proba = model.predict_proba(row)?;
            metrics.update(predicted, proba, label);
        }
        Ok(metrics)
    }

    pub fn update(&mut self, predicted: u8, proba: f32, label: u8) {
        let actual = u8::from(label == 1);
        if predicted == actual {
            self.correct += 1;
        }
        self.abs_error_sum += (proba as f64 - actual as f64).abs();
        self.total += 1;
    }

    /// Fraction of correct predictions
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Mean absolute probability error
    pub fn mean_abs_error(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.abs_error_sum / self.total as f64
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% ({}/{}) | Prob MAE: {:.3}",
            self.accuracy() * 100.0,
            self.correct,
            self.total,
            self.mean_abs_error()
        )
    }
}
