//! Data access
//!
//! Matchup manifests, the stores that hold them and the remote summary service.

pub mod aggregator;
pub mod database;
pub mod manifest;
pub mod store;

pub use aggregator::AggregatorClient;
pub use database::Database;
pub use manifest::{GameEvent, Manifest, MatchupKey};
pub use store::{DatasetStore, DirectoryStore, MemoryStore};

use crate::{Config, Result, StoreBackend};

/// Open the store selected in the configuration
pub fn open_store(config: &Config) -> Result<Box<dyn DatasetStore>> {
    match config.store.backend {
        StoreBackend::Directory => Ok(Box::new(DirectoryStore::new(
            &config.store.directory,
            &config.store.prefix,
        ))),
        StoreBackend::Sqlite => Ok(Box::new(Database::open(&config.store.database_path)?)),
    }
}
