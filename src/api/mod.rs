//! Request boundary
//!
//! Turns raw query/body input into a validated matchup and pipeline results
//! into status-coded JSON responses.

pub mod request;
pub mod response;

pub use request::{Matchup, PredictRequest};
pub use response::ApiResponse;

use crate::predict::{Pipeline, Stage, StageError};

/// Handle one prediction call from its raw query string and body
pub fn handle(pipeline: &Pipeline, query: Option<&str>, body: Option<&str>) -> ApiResponse {
    let request = match PredictRequest::from_parts(query, body) {
        Ok(request) => request,
        Err(error) => {
            return ApiResponse::from_error(&StageError {
                stage: Stage::Validate,
                error,
            })
        }
    };
    ApiResponse::from(pipeline.run(&request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::manifest::{fixtures, MatchupKey};
    use crate::data::MemoryStore;
    use crate::features::schema::FEATURE_DIM;
    use crate::features::{FeatureSource, MatchupGames};
    use crate::training::{TrainOnDemand, Trainer};
    use crate::TrainingConfig;
    use serde_json::json;

    fn pipeline_for(manifest: crate::data::Manifest) -> Pipeline {
        Pipeline::new(
            Box::new(MemoryStore::with(MatchupKey::new("BOS", "LAL"), manifest)),
            Box::new(TrainOnDemand::new(Trainer::new(TrainingConfig::default()))),
            FeatureSource::Local,
            5,
        )
    }

    fn pipeline() -> Pipeline {
        pipeline_for(fixtures::manifest(12))
    }

    #[test]
    fn test_successful_call() {
        let response = handle(&pipeline(), Some("team1=BOS&team2=LAL&home=1"), None);
        assert_eq!(response.status, 200);
        let body = response.body.as_object().unwrap();
        let fields = [
            "timestamp",
            "winning_rate",
            "prediction",
            "model_accuracy",
            "input_features",
        ];
        for field in fields {
            assert!(body.contains_key(field), "missing {}", field);
        }
        let prediction = body["prediction"].as_str().unwrap();
        assert!(prediction == "BOS wins" || prediction == "LAL wins");
    }

    #[test]
    fn test_short_history_averages_every_game() {
        let manifest = fixtures::manifest(3);
        let expected = MatchupGames::from_manifest(&manifest)
            .unwrap()
            .average_recent(3);

        let response = handle(&pipeline_for(manifest), Some("team1=BOS&team2=LAL&home=0"), None);
        assert_eq!(response.status, 200);

        let features: Vec<f64> = response.body["input_features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(features.len(), FEATURE_DIM);
        assert_eq!(features[0], 0.0);
        for (got, want) in features[1..].iter().zip(expected.iter()) {
            assert!((got - *want as f64).abs() < 1e-4);
        }
        let rate = response.body["winning_rate"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&rate));
    }

    #[test]
    fn test_complete_query_ignores_body() {
        let response = handle(&pipeline(), Some("team1=BOS&team2=LAL&home=1"), Some("{oops"));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_stat_beyond_f32_range_is_data_error() {
        let mut manifest = fixtures::manifest(12);
        for event in manifest.events.iter_mut().rev().take(2) {
            event.attributes.insert("TEAM1_PTS".into(), json!(1e39));
        }
        let response = handle(&pipeline_for(manifest), Some("team1=BOS&team2=LAL&home=1"), None);
        assert_eq!(response.status, 500);
        let message = response.body["error"].as_str().unwrap();
        assert!(message.contains("non-numeric value for field TEAM1_PTS"));
    }

    #[test]
    fn test_invalid_home() {
        let response = handle(&pipeline(), Some("team1=BOS&team2=LAL&home=2"), None);
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body,
            json!({ "error": "home court advantage can only be 0 or 1." })
        );
    }

    #[test]
    fn test_unknown_team() {
        let body = r#"{"team1":"BOS","team2":"XYZ","home":0}"#;
        let response = handle(&pipeline(), None, Some(body));
        assert_eq!(response.status, 404);
        assert_eq!(
            response.body,
            json!({ "error": "Invalid team abbreviation provided." })
        );
    }

    #[test]
    fn test_missing_fields() {
        let response = handle(&pipeline(), Some("team1=BOS"), None);
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body["error"],
            "Missing team1 or team2 abbreviation or home court advantage."
        );
    }

    #[test]
    fn test_malformed_body_is_client_error() {
        let response = handle(&pipeline(), None, Some("{oops"));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_missing_dataset_is_server_error() {
        let response = handle(&pipeline(), Some("team1=MIA&team2=BOS&home=0"), None);
        assert_eq!(response.status, 500);
        assert!(response.body["error"].as_str().unwrap().contains("NoSuchKey"));
    }
}
