//! Prediction
//!
//! Score the upcoming game with a fitted model and package the result.

pub mod inference;
pub mod pipeline;
pub mod result;

pub use inference::{Outcome, Predictor};
pub use pipeline::{Pipeline, Stage, StageError, StageResult};
pub use result::PredictionResult;
