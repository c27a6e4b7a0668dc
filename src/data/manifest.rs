//! Stored matchup manifests
//!
//! The ingestion side writes one manifest per ordered team pair. Each event
//! carries the raw per-game attributes exactly as collected.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{NbaError, Result, Team};

pub const DATA_SOURCE: &str = "nba_api";
pub const DATASET_TYPE: &str = "NBA Game Statistics";

/// Deterministic, order-sensitive key for a matchup dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchupKey(String);

impl MatchupKey {
    pub fn new(team1: &str, team2: &str) -> Self {
        MatchupKey(format!("{}vs{}", team1, team2))
    }

    pub fn for_teams(team1: &Team, team2: &Team) -> Self {
        Self::new(team1.abbreviation, team2.abbreviation)
    }

    /// Rebuild a key from its string form (e.g. a stored file stem)
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once("vs") {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok(MatchupKey(raw.to_string())),
            _ => Err(NbaError::Data(format!("invalid matchup key: {}", raw))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name used by object-style stores
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for MatchupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation time of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeObject {
    pub timestamp: DateTime<FixedOffset>,
    pub timezone: String,
}

impl TimeObject {
    pub fn now_utc() -> Self {
        TimeObject {
            timestamp: Utc::now().fixed_offset(),
            timezone: "UTC".to_string(),
        }
    }
}

/// Envelope time of a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTime {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<String>,
    pub timezone: String,
}

/// One historical game for the first team of the matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub time_object: EventTime,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    pub attributes: Map<String, Value>,
}

fn default_event_type() -> String {
    "game_statistics".to_string()
}

/// A matchup dataset as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub data_source: String,
    pub dataset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    pub time_object: TimeObject,
    pub events: Vec<GameEvent>,
}

impl Manifest {
    /// Manifest holding the given events, stamped with the current UTC time
    pub fn new(dataset_id: Option<String>, events: Vec<GameEvent>) -> Self {
        Manifest {
            data_source: DATA_SOURCE.to_string(),
            dataset_type: DATASET_TYPE.to_string(),
            dataset_id,
            time_object: TimeObject::now_utc(),
            events,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Matchup key recorded in `dataset_id`, if it follows the `<prefix>/<key>.json` layout
    pub fn matchup_key(&self) -> Option<MatchupKey> {
        let id = self.dataset_id.as_deref()?;
        let file = id.rsplit('/').next()?;
        let stem = file.strip_suffix(".json").unwrap_or(file);
        MatchupKey::parse(stem).ok()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    /// Build a game event with deterministic, plausible box-score numbers
    pub fn game(date: NaiveDate, home: u8, won: bool, seed: u32) -> GameEvent {
        let s = seed as f64;
        let win_bonus = if won { 8.0 } else { 0.0 };
        let attributes = json!({
            "GAME_DATE": date.format("%Y-%m-%d").to_string(),
            "HOME_GAME": home,
            "WL": if won { 1 } else { 0 },
            "TEAM1_PTS": 100.0 + win_bonus + (s % 7.0),
            "TEAM1_FGM": 38.0 + (s % 5.0),
            "TEAM1_FGA": 85.0 + (s % 4.0),
            "TEAM1_FG_PCT": 0.45 + (s % 3.0) / 100.0,
            "TEAM1_FG3M": 12.0 + (s % 6.0),
            "TEAM1_FG3A": 33.0 + (s % 5.0),
            "TEAM1_FG3_PCT": 0.36,
            "TEAM1_FTM": 16.0 + (s % 3.0),
            "TEAM1_FTA": 21.0,
            "TEAM1_FT_PCT": 0.78,
            "TEAM1_OREB": 10.0,
            "TEAM1_DREB": 33.0 + win_bonus / 4.0,
            "TEAM1_REB": 43.0 + win_bonus / 4.0,
            "TEAM1_AST": 24.0 + (s % 4.0),
            "TEAM1_STL": 7.0,
            "TEAM1_BLK": 5.0,
            "TEAM1_TOV": 14.0 - win_bonus / 4.0,
            "TEAM1_PF": 19.0
        });
        let attributes = match attributes {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        GameEvent {
            time_object: EventTime {
                timestamp: Utc::now().fixed_offset(),
                duration: Some(1),
                duration_unit: Some("day".to_string()),
                timezone: "UTC".to_string(),
            },
            event_type: default_event_type(),
            attributes,
        }
    }

    /// `n` games, one week apart, oldest first. Home/away alternates and
    /// wins/losses follow a 2:1 pattern.
    pub fn manifest(n: usize) -> Manifest {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let events = (0..n)
            .map(|i| {
                let date = start + Duration::days(7 * i as i64);
                game(date, (i % 2) as u8, i % 3 != 2, i as u32)
            })
            .collect();
        Manifest::new(Some("nba_teams_match_stats/BOSvsLAL.json".to_string()), events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_sensitive() {
        let a = MatchupKey::new("BOS", "LAL");
        let b = MatchupKey::new("LAL", "BOS");
        assert_eq!(a.as_str(), "BOSvsLAL");
        assert_ne!(a, b);
        assert_eq!(a.file_name(), "BOSvsLAL.json");
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(MatchupKey::parse("BOSvsLAL").unwrap(), MatchupKey::new("BOS", "LAL"));
        assert!(MatchupKey::parse("BOS").is_err());
        assert!(MatchupKey::parse("vsLAL").is_err());
    }

    #[test]
    fn test_manifest_from_ingestion_json() {
        let text = r#"{
            "data_source": "nba_api",
            "dataset_type": "NBA Game Statistics",
            "dataset_id": "nba-prediction-bucket/nba_teams_match_stats/BOSvsLAL.json",
            "time_object": {"timestamp": "2025-03-01T10:00:00.123456+00:00", "timezone": "UTC"},
            "events": [{
                "time_object": {
                    "timestamp": "2025-03-01T10:00:00.123456+00:00",
                    "duration": 1,
                    "duration_unit": "day",
                    "timezone": "UTC"
                },
                "event_type": "game_statistics",
                "attributes": {"GAME_DATE": "2025-02-01", "HOME_GAME": 1, "WL": 1, "TEAM1_PTS": 112}
            }]
        }"#;
        let manifest = Manifest::from_json(text).unwrap();
        assert_eq!(manifest.events.len(), 1);
        assert_eq!(manifest.events[0].attributes["TEAM1_PTS"], 112);
        assert_eq!(manifest.matchup_key(), Some(MatchupKey::new("BOS", "LAL")));
    }

    #[test]
    fn test_fixture_roundtrips_through_json() {
        let manifest = fixtures::manifest(4);
        let parsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }
}
