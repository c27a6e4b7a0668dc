//! Scoring the upcoming game

use crate::features::schema::FEATURE_DIM;
use crate::features::StatSummary;
use crate::training::TrainedModel;
use crate::{Result, Team};

/// Class value meaning "team1 wins"
pub const POSITIVE_CLASS: u8 = 1;

/// Hard class and positive-class probability for one input vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub class: u8,
    /// Probability that team1 wins, in [0, 1]
    pub probability: f32,
}

impl Outcome {
    /// Winner label, decided by the hard class alone
    pub fn winner_label(&self, team1: &Team, team2: &Team) -> String {
        let winner = if self.class == POSITIVE_CLASS { team1 } else { team2 };
        format!("{} wins", winner.abbreviation)
    }
}

/// Queries a fitted model for the requested matchup
pub struct Predictor<'a> {
    model: &'a TrainedModel,
}

impl<'a> Predictor<'a> {
    pub fn new(model: &'a TrainedModel) -> Self {
        Predictor { model }
    }

    /// Home flag followed by the averaged statistics, in training column order
    pub fn input_vector(home: f32, summary: &StatSummary) -> [f32; FEATURE_DIM] {
        let mut input = [0.0f32; FEATURE_DIM];
        input[0] = home;
        input[1..].copy_from_slice(&summary.means);
        input
    }

    pub fn predict(&self, input: &[f32]) -> Result<Outcome> {
        let classifier = &self.model.classifier;
        Ok(Outcome {
            class: classifier.predict(input)?,
            probability: classifier.predict_proba(input)?.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::schema::STAT_DIM;
    use crate::features::FeatureOrigin;
    use crate::find_team;
    use crate::training::dataset::FeatureNormalization;
    use crate::training::Classifier;

    fn model(bias: f32) -> TrainedModel {
        TrainedModel {
            classifier: Classifier {
                weights: vec![0.0; FEATURE_DIM],
                bias,
                norm: FeatureNormalization {
                    mean: vec![0.0; FEATURE_DIM],
                    std: vec![1.0; FEATURE_DIM],
                },
            },
            accuracy: 1.0,
        }
    }

    #[test]
    fn test_input_vector_layout() {
        let mut means = [0.0f32; STAT_DIM];
        means[0] = 110.0;
        means[STAT_DIM - 1] = 20.0;
        let summary = StatSummary {
            means,
            origin: FeatureOrigin::Local,
            degraded: false,
        };
        let input = Predictor::input_vector(1.0, &summary);
        assert_eq!(input.len(), FEATURE_DIM);
        assert_eq!(input[0], 1.0);
        assert_eq!(input[1], 110.0);
        assert_eq!(input[FEATURE_DIM - 1], 20.0);
    }

    #[test]
    fn test_winner_follows_class() {
        let bos = find_team("BOS").unwrap();
        let lal = find_team("LAL").unwrap();
        let input = [0.0f32; FEATURE_DIM];

        let win = Predictor::new(&model(2.0)).predict(&input).unwrap();
        assert_eq!(win.class, 1);
        assert_eq!(win.winner_label(&bos, &lal), "BOS wins");
        assert!(win.probability > 0.5);

        let loss = Predictor::new(&model(-2.0)).predict(&input).unwrap();
        assert_eq!(loss.class, 0);
        assert_eq!(loss.winner_label(&bos, &lal), "LAL wins");
        assert!(loss.probability < 0.5);
    }

    #[test]
    fn test_boundary_goes_to_team2() {
        let bos = find_team("BOS").unwrap();
        let lal = find_team("LAL").unwrap();
        let even = Predictor::new(&model(0.0)).predict(&[0.0; FEATURE_DIM]).unwrap();
        assert_eq!(even.probability, 0.5);
        assert_eq!(even.winner_label(&bos, &lal), "LAL wins");
    }

    #[test]
    fn test_non_one_class_is_team2() {
        let bos = find_team("BOS").unwrap();
        let lal = find_team("LAL").unwrap();
        let outcome = Outcome {
            class: 7,
            probability: 0.9,
        };
        assert_eq!(outcome.winner_label(&bos, &lal), "LAL wins");
    }
}
