//! Feature extraction
//!
//! Converts stored games into the training matrix and the averaged
//! recent-form vector used at inference time.

pub mod extract;
pub mod game;
pub mod schema;
pub mod source;

pub use extract::{average_stats, MatchupGames, TrainingMatrix};
pub use game::GameRecord;
pub use source::{FeatureOrigin, FeatureSource, StatSummary};
