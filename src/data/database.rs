//! SQLite-backed dataset store

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::manifest::{Manifest, MatchupKey};
use super::store::{no_such_key, DatasetStore};
use crate::Result;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS datasets (
                key TEXT PRIMARY KEY,
                data_source TEXT NOT NULL,
                dataset_type TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                game_count INTEGER NOT NULL,
                manifest TEXT NOT NULL,
                stored_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace the manifest for a matchup
    pub fn upsert_manifest(&self, key: &MatchupKey, manifest: &Manifest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO datasets
                (key, data_source, dataset_type, generated_at, game_count, manifest)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                data_source = excluded.data_source,
                dataset_type = excluded.dataset_type,
                generated_at = excluded.generated_at,
                game_count = excluded.game_count,
                manifest = excluded.manifest,
                stored_at = datetime('now')",
            params![
                key.as_str(),
                manifest.data_source,
                manifest.dataset_type,
                manifest.time_object.timestamp.to_rfc3339(),
                manifest.events.len() as i64,
                manifest.to_json()?,
            ],
        )?;
        Ok(())
    }

    /// Fetch the manifest for a matchup, if stored
    pub fn get_manifest(&self, key: &MatchupKey) -> Result<Option<Manifest>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT manifest FROM datasets WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        text.map(|t| Manifest::from_json(&t)).transpose()
    }

    /// All stored matchup keys, sorted
    pub fn get_keys(&self) -> Result<Vec<MatchupKey>> {
        let mut stmt = self.conn.prepare("SELECT key FROM datasets ORDER BY key")?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.iter().map(|k| MatchupKey::parse(k)).collect()
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let (dataset_count, game_count): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(game_count), 0) FROM datasets",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let newest: Option<String> = self
            .conn
            .query_row("SELECT MAX(generated_at) FROM datasets", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            dataset_count: dataset_count as usize,
            game_count: game_count as usize,
            newest_dataset: newest.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()),
        })
    }
}

impl DatasetStore for Database {
    fn load(&self, key: &MatchupKey) -> Result<Manifest> {
        self.get_manifest(key)?
            .ok_or_else(|| no_such_key(key, "datasets"))
    }

    fn save(&self, key: &MatchupKey, manifest: &Manifest) -> Result<()> {
        self.upsert_manifest(key, manifest)
    }

    fn keys(&self) -> Result<Vec<MatchupKey>> {
        self.get_keys()
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub dataset_count: usize,
    pub game_count: usize,
    pub newest_dataset: Option<DateTime<FixedOffset>>,
}
