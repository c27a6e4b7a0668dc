//! Prediction result assembly

use serde::Serialize;

use super::inference::Outcome;
use crate::features::{FeatureOrigin, StatSummary};
use crate::Team;

/// Everything returned for a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Response capture time, milliseconds since the epoch
    pub timestamp: f64,
    /// Probability that team1 wins
    pub winning_rate: f64,
    /// `"<TEAM> wins"`
    pub prediction: String,
    /// Holdout accuracy of the model used
    pub model_accuracy: f64,
    /// Exact vector the model scored
    pub input_features: Vec<f32>,
    #[serde(skip)]
    pub origin: FeatureOrigin,
    /// Set when substituted defaults fed the input vector
    #[serde(skip)]
    pub degraded: bool,
}

/// Package a scored outcome; the timestamp is taken now
pub fn assemble(
    outcome: &Outcome,
    team1: &Team,
    team2: &Team,
    accuracy: f64,
    input: &[f32],
    summary: &StatSummary,
) -> PredictionResult {
    PredictionResult {
        timestamp: chrono::Utc::now().timestamp_micros() as f64 / 1000.0,
        winning_rate: outcome.probability as f64,
        prediction: outcome.winner_label(team1, team2),
        model_accuracy: accuracy,
        input_features: input.to_vec(),
        origin: summary.origin,
        degraded: summary.degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::schema::{FEATURE_DIM, STAT_DIM};
    use crate::find_team;

    #[test]
    fn test_assemble() {
        let bos = find_team("BOS").unwrap();
        let lal = find_team("LAL").unwrap();
        let outcome = Outcome {
            class: 1,
            probability: 0.75,
        };
        let summary = StatSummary {
            means: [1.0; STAT_DIM],
            origin: FeatureOrigin::Fallback,
            degraded: true,
        };
        let input = [0.5f32; FEATURE_DIM];

        let before = chrono::Utc::now().timestamp_millis() as f64;
        let result = assemble(&outcome, &bos, &lal, 0.5, &input, &summary);
        let after = chrono::Utc::now().timestamp_millis() as f64 + 1.0;

        assert!(result.timestamp >= before && result.timestamp <= after);
        assert_eq!(result.winning_rate, 0.75);
        assert_eq!(result.prediction, "BOS wins");
        assert_eq!(result.model_accuracy, 0.5);
        assert_eq!(result.input_features, input.to_vec());
        assert!(result.degraded);
    }

    #[test]
    fn test_serialized_fields() {
        let bos = find_team("BOS").unwrap();
        let lal = find_team("LAL").unwrap();
        let outcome = Outcome {
            class: 0,
            probability: 0.25,
        };
        let summary = StatSummary {
            means: [0.0; STAT_DIM],
            origin: FeatureOrigin::Local,
            degraded: false,
        };
        let result = assemble(&outcome, &bos, &lal, 1.0, &[0.0; FEATURE_DIM], &summary);
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["input_features", "model_accuracy", "prediction", "timestamp", "winning_rate"]
        );
        assert_eq!(obj["prediction"], "LAL wins");
        assert_eq!(obj["input_features"].as_array().unwrap().len(), FEATURE_DIM);
    }
}
