//! Request pipeline
//!
//! Each stage returns its own error tagged with the stage it came from. The
//! tags only feed logs; the response status is derived from the error kind in
//! one place (`api::response`).

use std::fmt;

use super::inference::Predictor;
use super::result::{assemble, PredictionResult};
use crate::api::request::{Matchup, PredictRequest};
use crate::data::manifest::MatchupKey;
use crate::data::{open_store, DatasetStore};
use crate::features::{FeatureSource, MatchupGames};
use crate::training::provider::{self, ModelProvider};
use crate::{Config, ErrorKind, NbaError};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Load,
    Extract,
    Train,
    Infer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Load => "load",
            Stage::Extract => "extract",
            Stage::Train => "train",
            Stage::Infer => "infer",
        };
        write!(f, "{}", name)
    }
}

/// An error and the stage that raised it. Displays as the bare error message.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: NbaError,
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type StageResult<T> = std::result::Result<T, StageError>;

trait AtStage<T> {
    fn at(self, stage: Stage) -> StageResult<T>;
}

impl<T> AtStage<T> for crate::Result<T> {
    fn at(self, stage: Stage) -> StageResult<T> {
        self.map_err(|error| StageError { stage, error })
    }
}

/// Validate, load, extract, train, summarize recent form, infer
pub struct Pipeline {
    store: Box<dyn DatasetStore>,
    provider: Box<dyn ModelProvider>,
    source: FeatureSource,
    window: usize,
}

impl Pipeline {
    pub fn new(
        store: Box<dyn DatasetStore>,
        provider: Box<dyn ModelProvider>,
        source: FeatureSource,
        window: usize,
    ) -> Self {
        Pipeline {
            store,
            provider,
            source,
            window,
        }
    }

    /// Wire every component from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Pipeline::new(
            open_store(config)?,
            provider::from_config(config)?,
            FeatureSource::from_config(config)?,
            config.features.window,
        ))
    }

    /// Run a raw request end to end. Validation happens before any I/O.
    pub fn run(&self, request: &PredictRequest) -> StageResult<PredictionResult> {
        let matchup = request.validate().at(Stage::Validate)?;
        self.predict(&matchup)
    }

    pub fn predict(&self, matchup: &Matchup) -> StageResult<PredictionResult> {
        let key = MatchupKey::for_teams(&matchup.team1, &matchup.team2);
        log::info!(
            "Predicting {} (home={}) with {} provider",
            key,
            matchup.home,
            self.provider.name()
        );

        let manifest = self.store.load(&key).at(Stage::Load)?;
        let games = MatchupGames::from_manifest(&manifest).at(Stage::Extract)?;
        log::debug!("{} games on record for {}", games.len(), key);

        let matrix = games.training_matrix();
        let model = self.provider.provide(&key, &matrix).at(Stage::Train)?;

        let summary = self.source.summarize(&key, &games, self.window);
        if summary.degraded {
            log::warn!("Prediction for {} uses substituted statistics", key);
        }

        let input = Predictor::input_vector(matchup.home, &summary);
        let outcome = Predictor::new(&model).predict(&input).at(Stage::Infer)?;

        let result = assemble(
            &outcome,
            &matchup.team1,
            &matchup.team2,
            model.accuracy,
            &input,
            &summary,
        );
        log::info!(
            "{}: {} (p={:.3}, accuracy={:.3})",
            key,
            result.prediction,
            result.winning_rate,
            result.model_accuracy
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::manifest::{fixtures, Manifest};
    use crate::data::MemoryStore;
    use crate::features::schema::FEATURE_DIM;
    use crate::features::FeatureOrigin;
    use crate::training::{CachedByMatchup, TrainOnDemand, Trainer};
    use crate::{AggregatorConfig, TrainingConfig};
    use chrono::NaiveDate;

    fn on_demand() -> Box<dyn ModelProvider> {
        Box::new(TrainOnDemand::new(Trainer::new(TrainingConfig::default())))
    }

    fn pipeline(store: MemoryStore) -> Pipeline {
        Pipeline::new(Box::new(store), on_demand(), FeatureSource::Local, 5)
    }

    fn bos_lal(n: usize) -> MemoryStore {
        MemoryStore::with(MatchupKey::new("BOS", "LAL"), fixtures::manifest(n))
    }

    #[test]
    fn test_successful_prediction() {
        let result = pipeline(bos_lal(12))
            .run(&PredictRequest::new("BOS", "LAL", "1"))
            .unwrap();

        assert!(result.prediction == "BOS wins" || result.prediction == "LAL wins");
        assert!((0.0..=1.0).contains(&result.winning_rate));
        assert!((0.0..=1.0).contains(&result.model_accuracy));
        assert_eq!(result.input_features.len(), FEATURE_DIM);
        assert_eq!(result.input_features[0], 1.0);
        assert_eq!(result.origin, FeatureOrigin::Local);
        assert!(!result.degraded);
        assert!(result.timestamp > 0.0);
    }

    #[test]
    fn test_repeat_requests_agree() {
        let p = pipeline(bos_lal(15));
        let request = PredictRequest::new("BOS", "LAL", "0");
        let a = p.run(&request).unwrap();
        let b = p.run(&request).unwrap();
        assert_eq!(a.prediction, b.prediction);
        assert_eq!(a.winning_rate, b.winning_rate);
        assert_eq!(a.model_accuracy, b.model_accuracy);
        assert_eq!(a.input_features, b.input_features);
    }

    #[test]
    fn test_validation_precedes_load() {
        // Empty store: a load would fail, so a validation error proves ordering
        let err = pipeline(MemoryStore::new())
            .run(&PredictRequest::new("BOS", "LAL", "3"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Validate);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_missing_dataset() {
        let err = pipeline(bos_lal(10))
            .run(&PredictRequest::new("MIA", "BOS", "0"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Load);
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(err.to_string().contains("MIAvsBOS"));
    }

    #[test]
    fn test_single_outcome_history() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let events = (0..6)
            .map(|i| {
                let day = date + chrono::Duration::days(i * 7);
                fixtures::game(day, (i % 2) as u8, true, i as u32)
            })
            .collect();
        let store = MemoryStore::with(MatchupKey::new("BOS", "LAL"), Manifest::new(None, events));

        let err = pipeline(store)
            .run(&PredictRequest::new("BOS", "LAL", "1"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Train);
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(err.to_string(), "insufficient class diversity to train");
    }

    #[test]
    fn test_empty_history() {
        let empty = Manifest::new(None, Vec::new());
        let store = MemoryStore::with(MatchupKey::new("BOS", "LAL"), empty);
        let err = pipeline(store)
            .run(&PredictRequest::new("BOS", "LAL", "1"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Extract);
        assert_eq!(err.to_string(), "no games available for matchup");
    }

    #[test]
    fn test_aggregator_down_degrades() {
        let config = Config {
            aggregator: AggregatorConfig {
                enabled: true,
                preprocess_url: None,
                analyse_url: "http://127.0.0.1:9/analyse".to_string(),
                timeout_secs: 2,
                max_attempts: 1,
            },
            ..Config::default()
        };
        let source = FeatureSource::from_config(&config).unwrap();
        let p = Pipeline::new(Box::new(bos_lal(12)), on_demand(), source, 5);

        let result = p.run(&PredictRequest::new("BOS", "LAL", "0")).unwrap();
        assert!(result.degraded);
        assert_eq!(result.origin, FeatureOrigin::Fallback);
        assert_eq!(result.input_features, vec![0.0; FEATURE_DIM]);
    }

    #[test]
    fn test_cached_provider_in_pipeline() {
        let p = Pipeline::new(
            Box::new(bos_lal(12)),
            Box::new(CachedByMatchup::new(Trainer::new(TrainingConfig::default()))),
            FeatureSource::Local,
            5,
        );
        let request = PredictRequest::new("BOS", "LAL", "1");
        let a = p.run(&request).unwrap();
        let b = p.run(&request).unwrap();
        assert_eq!(a.prediction, b.prediction);
        assert_eq!(a.model_accuracy, b.model_accuracy);
    }
}
