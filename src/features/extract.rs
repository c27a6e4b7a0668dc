//! Training matrix and rolling-window averages
//!
//! Games are ordered newest first before anything else happens; rows of the
//! training matrix and the averaging window both follow that order.

use super::game::GameRecord;
use super::schema::{FEATURE_DIM, STAT_DIM};
use crate::data::manifest::{GameEvent, Manifest};
use crate::{NbaError, Result};

/// Games of one matchup, newest first, each paired with its raw event
#[derive(Debug, Clone)]
pub struct MatchupGames {
    records: Vec<GameRecord>,
    events: Vec<GameEvent>,
}

impl MatchupGames {
    /// Coerce and order every stored game
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        if manifest.events.is_empty() {
            return Err(NbaError::Data("no games available for matchup".to_string()));
        }

        let mut indexed = manifest
            .events
            .iter()
            .enumerate()
            .map(|(i, event)| Ok((GameRecord::from_event(event, i)?, event.clone())))
            .collect::<Result<Vec<_>>>()?;

        // Stable: equal dates keep storage order
        indexed.sort_by(|a, b| b.0.date.cmp(&a.0.date));

        let (records, events) = indexed.into_iter().unzip();
        Ok(MatchupGames { records, events })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// The `window` most recent raw events (all of them if fewer exist)
    pub fn recent_events(&self, window: usize) -> &[GameEvent] {
        &self.events[..window.min(self.events.len())]
    }

    /// The `window` most recent games (all of them if fewer exist)
    pub fn recent(&self, window: usize) -> &[GameRecord] {
        &self.records[..window.min(self.records.len())]
    }

    /// Numeric training set over every game
    pub fn training_matrix(&self) -> TrainingMatrix {
        TrainingMatrix::from_records(&self.records)
    }

    /// Per-statistic means over the most recent `window` games
    pub fn average_recent(&self, window: usize) -> [f32; STAT_DIM] {
        average_stats(self.recent(window))
    }
}

/// Row-major feature matrix `x` with aligned class labels `y`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMatrix {
    rows: Vec<[f32; FEATURE_DIM]>,
    labels: Vec<u8>,
}

impl TrainingMatrix {
    pub fn from_records(records: &[GameRecord]) -> Self {
        TrainingMatrix {
            rows: records.iter().map(GameRecord::to_row).collect(),
            labels: records.iter().map(GameRecord::class).collect(),
        }
    }

    /// Build from explicit rows and labels; lengths must agree
    pub fn new(rows: Vec<[f32; FEATURE_DIM]>, labels: Vec<u8>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(NbaError::Data(format!(
                "training matrix has {} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        Ok(TrainingMatrix { rows, labels })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        FEATURE_DIM
    }

    pub fn rows(&self) -> &[[f32; FEATURE_DIM]] {
        &self.rows
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Number of distinct label classes present
    pub fn class_count(&self) -> usize {
        let has_win = self.labels.iter().any(|&l| l == 1);
        let has_loss = self.labels.iter().any(|&l| l != 1);
        usize::from(has_win) + usize::from(has_loss)
    }

    /// Subset of rows by index, preserving the given order
    pub fn select(&self, indices: &[usize]) -> TrainingMatrix {
        TrainingMatrix {
            rows: indices.iter().map(|&i| self.rows[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Mean of each statistic; an empty slice gives all zeros
pub fn average_stats(records: &[GameRecord]) -> [f32; STAT_DIM] {
    let mut means = [0.0f32; STAT_DIM];
    if records.is_empty() {
        return means;
    }

    for record in records {
        for (sum, value) in means.iter_mut().zip(record.stats.iter()) {
            *sum += value;
        }
    }

    let n = records.len() as f32;
    for mean in means.iter_mut() {
        *mean /= n;
    }
    means
}
