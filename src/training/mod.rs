//! Model training
//!
//! Holdout split, class-balanced classifier fitting and the providers that
//! hand fitted models to the pipeline.

pub mod classifier;
pub mod dataset;
pub mod metrics;
pub mod provider;
pub mod split;
pub mod trainer;

pub use classifier::{Classifier, LogisticTrainer, TrainingBackend};
pub use metrics::Metrics;
pub use provider::{
    CachedByMatchup, ModelProvider, ModelSnapshot, PretrainedSnapshot, TrainOnDemand,
};
pub use split::HoldoutSplit;
pub use trainer::{TrainedModel, Trainer};
