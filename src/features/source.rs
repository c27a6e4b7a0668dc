//! Where the averaged recent-form statistics come from

use serde::Serialize;

use super::extract::MatchupGames;
use super::schema::{stat_index, STAT_DIM};
use crate::data::aggregator::{AggregatorClient, StatMeans};
use crate::data::manifest::{Manifest, MatchupKey};
use crate::{Config, Result};

/// Origin of the statistics in an inference vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureOrigin {
    /// Means returned by the remote summary service
    Remote,
    /// Means computed in-process over the recent window
    Local,
    /// The remote service failed; defaults were substituted
    Fallback,
}

/// Averaged statistics plus how they were obtained
#[derive(Debug, Clone, PartialEq)]
pub struct StatSummary {
    pub means: [f32; STAT_DIM],
    pub origin: FeatureOrigin,
    /// Set when any statistic holds a substituted default
    pub degraded: bool,
}

/// Strategy for averaging the recent window
pub enum FeatureSource {
    Remote {
        client: AggregatorClient,
        dataset_prefix: String,
    },
    Local,
}

impl FeatureSource {
    /// Remote when the aggregator is enabled, local otherwise
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.aggregator.enabled {
            Ok(FeatureSource::Remote {
                client: AggregatorClient::new(&config.aggregator)?,
                dataset_prefix: config.store.prefix.clone(),
            })
        } else {
            Ok(FeatureSource::Local)
        }
    }

    /// Means over the `window` most recent games. Never fails: remote errors
    /// degrade to zero defaults.
    pub fn summarize(&self, key: &MatchupKey, games: &MatchupGames, window: usize) -> StatSummary {
        match self {
            FeatureSource::Local => StatSummary {
                means: games.average_recent(window),
                origin: FeatureOrigin::Local,
                degraded: false,
            },
            FeatureSource::Remote {
                client,
                dataset_prefix,
            } => {
                let dataset_id = format!("{}/{}", dataset_prefix, key.file_name());
                let request = Manifest::new(Some(dataset_id), games.recent_events(window).to_vec());

                match client.summarize(&request) {
                    Ok(remote) => from_remote(&remote),
                    Err(e) => {
                        log::warn!("Aggregator unavailable for {}, using defaults: {}", key, e);
                        StatSummary {
                            means: [0.0; STAT_DIM],
                            origin: FeatureOrigin::Fallback,
                            degraded: true,
                        }
                    }
                }
            }
        }
    }
}

/// Place remote means into schema order; absent statistics stay zero
pub fn from_remote(remote: &StatMeans) -> StatSummary {
    let mut means = [0.0f32; STAT_DIM];
    let mut filled = [false; STAT_DIM];

    for (name, value) in remote {
        match stat_index(name) {
            Some(i) => {
                means[i] = *value;
                filled[i] = true;
            }
            None => log::debug!("Ignoring unknown statistic {}", name),
        }
    }

    let missing = filled.iter().filter(|f| !**f).count();
    if missing > 0 {
        log::warn!("Aggregator omitted {} statistics, defaulting them to 0", missing);
    }

    StatSummary {
        means,
        origin: FeatureOrigin::Remote,
        degraded: missing > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::manifest::fixtures;
    use crate::features::schema::STAT_FIELDS;
    use crate::AggregatorConfig;

    #[test]
    fn test_local_source() {
        let games = MatchupGames::from_manifest(&fixtures::manifest(8)).unwrap();
        let summary = FeatureSource::Local.summarize(&MatchupKey::new("BOS", "LAL"), &games, 5);
        assert_eq!(summary.origin, FeatureOrigin::Local);
        assert!(!summary.degraded);
        assert_eq!(summary.means, games.average_recent(5));
    }

    #[test]
    fn test_remote_failure_falls_back() {
        let mut config = Config::default();
        config.aggregator = AggregatorConfig {
            enabled: true,
            preprocess_url: None,
            analyse_url: "http://127.0.0.1:9/analyse".to_string(),
            timeout_secs: 2,
            max_attempts: 1,
        };
        let source = FeatureSource::from_config(&config).unwrap();
        let games = MatchupGames::from_manifest(&fixtures::manifest(4)).unwrap();

        let summary = source.summarize(&MatchupKey::new("BOS", "LAL"), &games, 5);
        assert_eq!(summary.origin, FeatureOrigin::Fallback);
        assert!(summary.degraded);
        assert_eq!(summary.means, [0.0; STAT_DIM]);
    }

    #[test]
    fn test_remote_means_follow_schema_order() {
        let remote: StatMeans = STAT_FIELDS
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i as f32))
            .collect();
        let summary = from_remote(&remote);
        assert!(!summary.degraded);
        for (i, mean) in summary.means.iter().enumerate() {
            assert_eq!(*mean, i as f32);
        }
    }

    #[test]
    fn test_partial_remote_means_are_degraded() {
        let mut remote = StatMeans::new();
        remote.insert("TEAM1_PTS".to_string(), 101.0);
        remote.insert("SOMETHING_ELSE".to_string(), 9.0);
        let summary = from_remote(&remote);
        assert!(summary.degraded);
        assert_eq!(summary.origin, FeatureOrigin::Remote);
        assert_eq!(summary.means[0], 101.0);
        assert_eq!(summary.means[1], 0.0);
    }

    #[test]
    fn test_disabled_aggregator_is_local() {
        let source = FeatureSource::from_config(&Config::default()).unwrap();
        assert!(matches!(source, FeatureSource::Local));
    }
}
