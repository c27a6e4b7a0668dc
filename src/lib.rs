//! NBA matchup prediction
//!
//! Trains a class-balanced classifier on the stored head-to-head history of a
//! matchup and scores the upcoming game from the averaged recent form.

pub mod api;
pub mod data;
pub mod features;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A league team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub abbreviation: &'static str,
    pub name: &'static str,
}

/// Every franchise the ingestion side can collect a matchup for
pub const TEAMS: [Team; 30] = [
    Team {
        abbreviation: "ATL",
        name: "Atlanta Hawks",
    },
    Team {
        abbreviation: "BOS",
        name: "Boston Celtics",
    },
    Team {
        abbreviation: "BKN",
        name: "Brooklyn Nets",
    },
    Team {
        abbreviation: "CHA",
        name: "Charlotte Hornets",
    },
    Team {
        abbreviation: "CHI",
        name: "Chicago Bulls",
    },
    Team {
        abbreviation: "CLE",
        name: "Cleveland Cavaliers",
    },
    Team {
        abbreviation: "DAL",
        name: "Dallas Mavericks",
    },
    Team {
        abbreviation: "DEN",
        name: "Denver Nuggets",
    },
    Team {
        abbreviation: "DET",
        name: "Detroit Pistons",
    },
    Team {
        abbreviation: "GSW",
        name: "Golden State Warriors",
    },
    Team {
        abbreviation: "HOU",
        name: "Houston Rockets",
    },
    Team {
        abbreviation: "IND",
        name: "Indiana Pacers",
    },
    Team {
        abbreviation: "LAC",
        name: "Los Angeles Clippers",
    },
    Team {
        abbreviation: "LAL",
        name: "Los Angeles Lakers",
    },
    Team {
        abbreviation: "MEM",
        name: "Memphis Grizzlies",
    },
    Team {
        abbreviation: "MIA",
        name: "Miami Heat",
    },
    Team {
        abbreviation: "MIL",
        name: "Milwaukee Bucks",
    },
    Team {
        abbreviation: "MIN",
        name: "Minnesota Timberwolves",
    },
    Team {
        abbreviation: "NOP",
        name: "New Orleans Pelicans",
    },
    Team {
        abbreviation: "NYK",
        name: "New York Knicks",
    },
    Team {
        abbreviation: "OKC",
        name: "Oklahoma City Thunder",
    },
    Team {
        abbreviation: "ORL",
        name: "Orlando Magic",
    },
    Team {
        abbreviation: "PHI",
        name: "Philadelphia 76ers",
    },
    Team {
        abbreviation: "PHX",
        name: "Phoenix Suns",
    },
    Team {
        abbreviation: "POR",
        name: "Portland Trail Blazers",
    },
    Team {
        abbreviation: "SAC",
        name: "Sacramento Kings",
    },
    Team {
        abbreviation: "SAS",
        name: "San Antonio Spurs",
    },
    Team {
        abbreviation: "TOR",
        name: "Toronto Raptors",
    },
    Team {
        abbreviation: "UTA",
        name: "Utah Jazz",
    },
    Team {
        abbreviation: "WAS",
        name: "Washington Wizards",
    },
];

/// Look up a team by abbreviation, ignoring case and surrounding whitespace
pub fn find_team(abbreviation: &str) -> Option<Team> {
    let wanted = abbreviation.trim();
    TEAMS
        .iter()
        .find(|t| t.abbreviation.eq_ignore_ascii_case(wanted))
        .copied()
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation)
    }
}

/// Failure categories surfaced at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Dependency,
    Data,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Dependency => write!(f, "dependency"),
            ErrorKind::Data => write!(f, "data"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum NbaError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Dependency(String),

    #[error("{0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl NbaError {
    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            NbaError::Validation(_) => ErrorKind::Validation,
            NbaError::NotFound(_) => ErrorKind::NotFound,
            NbaError::Data(_) | NbaError::Json(_) => ErrorKind::Data,
            NbaError::Dependency(_)
            | NbaError::Config(_)
            | NbaError::Http(_)
            | NbaError::Database(_)
            | NbaError::Io(_) => ErrorKind::Dependency,
        }
    }
}

pub type Result<T> = std::result::Result<T, NbaError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub aggregator: AggregatorConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Directory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root directory for the directory backend
    pub directory: String,
    /// Object key prefix the ingestion side writes under
    pub prefix: String,
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Directory,
            directory: "data".to_string(),
            prefix: "nba_teams_match_stats".to_string(),
            database_path: "data/nba.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub enabled: bool,
    /// Optional first hop; its response is forwarded to `analyse_url`
    pub preprocess_url: Option<String>,
    pub analyse_url: String,
    pub timeout_secs: u64,
    /// Attempts per hop for transport failures (1 = no retry)
    pub max_attempts: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            enabled: false,
            preprocess_url: None,
            analyse_url: "http://localhost:8080/analyse".to_string(),
            timeout_secs: 10,
            max_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Recent games averaged into the inference vector
    pub window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig { window: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub holdout_fraction: f32,
    pub seed: u64,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            holdout_fraction: 0.2,
            seed: 42,
            epochs: 300,
            learning_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OnDemand,
    Cached,
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub snapshot_path: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            provider: ProviderKind::OnDemand,
            snapshot_path: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NbaError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| NbaError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NbaError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_team() {
        assert_eq!(find_team("BOS").unwrap().name, "Boston Celtics");
        assert_eq!(find_team(" lal ").unwrap().abbreviation, "LAL");
        assert!(find_team("AAA").is_none());
        assert!(find_team("").is_none());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(NbaError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(NbaError::Config("x".into()).kind(), ErrorKind::Dependency);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(NbaError::from(io).kind(), ErrorKind::Dependency);
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(NbaError::from(json).kind(), ErrorKind::Data);
    }

    #[test]
    fn test_config_roundtrip_defaults() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.features.window, 5);
        assert_eq!(parsed.training.seed, 42);
        assert_eq!(parsed.model.provider, ProviderKind::OnDemand);
        assert_eq!(parsed.store.backend, StoreBackend::Directory);
    }

    #[test]
    fn test_partial_config() {
        let parsed: Config = toml::from_str("[features]\nwindow = 3\n").unwrap();
        assert_eq!(parsed.features.window, 3);
        assert_eq!(parsed.training.holdout_fraction, 0.2);
    }
}
