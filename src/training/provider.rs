//! Model providers
//!
//! The pipeline asks a provider for a fitted model per request. Training on
//! demand keeps no state; the cached provider reuses models per matchup and the
//! snapshot provider serves a model trained ahead of time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use super::classifier::Classifier;
use super::trainer::{TrainedModel, Trainer};
use crate::data::manifest::MatchupKey;
use crate::features::schema::{feature_columns, SCHEMA_VERSION};
use crate::features::TrainingMatrix;
use crate::{Config, NbaError, ProviderKind, Result};

/// Source of fitted models
pub trait ModelProvider {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// A fitted model for the matchup whose training matrix is `matrix`
    fn provide(&self, key: &MatchupKey, matrix: &TrainingMatrix) -> Result<TrainedModel>;
}

/// Build the provider selected in the configuration
pub fn from_config(config: &Config) -> Result<Box<dyn ModelProvider>> {
    let trainer = Trainer::new(config.training.clone());
    match config.model.provider {
        ProviderKind::OnDemand => Ok(Box::new(TrainOnDemand::new(trainer))),
        ProviderKind::Cached => Ok(Box::new(CachedByMatchup::new(trainer))),
        ProviderKind::Snapshot => {
            let path = config.model.snapshot_path.as_deref().ok_or_else(|| {
                NbaError::Config("model.snapshot_path is required for the snapshot provider".into())
            })?;
            Ok(Box::new(PretrainedSnapshot::load(path)?))
        }
    }
}

/// Fresh training for every request
pub struct TrainOnDemand {
    trainer: Trainer,
}

impl TrainOnDemand {
    pub fn new(trainer: Trainer) -> Self {
        TrainOnDemand { trainer }
    }
}

impl ModelProvider for TrainOnDemand {
    fn name(&self) -> &'static str {
        "on_demand"
    }

    fn provide(&self, _key: &MatchupKey, matrix: &TrainingMatrix) -> Result<TrainedModel> {
        self.trainer.train(matrix)
    }
}

/// Trains once per matchup and dataset size, then reuses the model
pub struct CachedByMatchup {
    trainer: Trainer,
    models: RwLock<HashMap<(MatchupKey, usize), TrainedModel>>,
}

impl CachedByMatchup {
    pub fn new(trainer: Trainer) -> Self {
        CachedByMatchup {
            trainer,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.models.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelProvider for CachedByMatchup {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn provide(&self, key: &MatchupKey, matrix: &TrainingMatrix) -> Result<TrainedModel> {
        let cache_key = (key.clone(), matrix.len());

        if let Some(model) = self
            .models
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&cache_key)
        {
            log::debug!("Reusing cached model for {}", key);
            return Ok(model.clone());
        }

        let model = self.trainer.train(matrix)?;
        self.models
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cache_key, model.clone());
        Ok(model)
    }
}

/// Serialized model, tied to the feature schema it was trained with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub schema_version: u32,
    pub columns: Vec<String>,
    pub matchup: MatchupKey,
    pub classifier: Classifier,
    pub accuracy: f64,
    pub created_at: DateTime<Utc>,
}

impl ModelSnapshot {
    pub fn new(matchup: MatchupKey, model: &TrainedModel) -> Self {
        ModelSnapshot {
            schema_version: SCHEMA_VERSION,
            columns: feature_columns().into_iter().map(String::from).collect(),
            matchup,
            classifier: model.classifier.clone(),
            accuracy: model.accuracy,
            created_at: Utc::now(),
        }
    }

    /// Reject snapshots whose columns differ from the current schema
    pub fn validate(&self) -> Result<()> {
        let expected = feature_columns();
        if self.schema_version != SCHEMA_VERSION
            || self.columns.len() != expected.len()
            || self.columns.iter().zip(expected.iter()).any(|(a, b)| a != b)
        {
            return Err(NbaError::Config(format!(
                "snapshot schema v{} does not match feature schema v{}",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if self.classifier.weights.len() != expected.len()
            || self.classifier.norm.mean.len() != expected.len()
            || self.classifier.norm.std.len() != expected.len()
        {
            return Err(NbaError::Config(
                "snapshot parameters do not match the feature width".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            NbaError::Config(format!("Failed to read model snapshot {}: {}", path, e))
        })?;
        let snapshot: ModelSnapshot = serde_json::from_str(&text)
            .map_err(|e| NbaError::Config(format!("Failed to parse model snapshot: {}", e)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Serves a model trained ahead of time for one matchup
pub struct PretrainedSnapshot {
    snapshot: ModelSnapshot,
}

impl PretrainedSnapshot {
    pub fn new(snapshot: ModelSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(PretrainedSnapshot { snapshot })
    }

    pub fn load(path: &str) -> Result<Self> {
        let snapshot = ModelSnapshot::load(path)?;
        log::info!(
            "Loaded snapshot for {} (accuracy {:.3})",
            snapshot.matchup,
            snapshot.accuracy
        );
        Ok(PretrainedSnapshot { snapshot })
    }
}

impl ModelProvider for PretrainedSnapshot {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn provide(&self, key: &MatchupKey, _matrix: &TrainingMatrix) -> Result<TrainedModel> {
        if key != &self.snapshot.matchup {
            return Err(NbaError::Data(format!(
                "snapshot was trained for {}, not {}",
                self.snapshot.matchup, key
            )));
        }
        Ok(TrainedModel {
            classifier: self.snapshot.classifier.clone(),
            accuracy: self.snapshot.accuracy,
        })
    }
}
