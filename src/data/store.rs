//! Dataset store backends
//!
//! The pipeline only reads from a store; writes belong to ingestion and the
//! `data import` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::manifest::{Manifest, MatchupKey};
use crate::{NbaError, Result};

/// Read/write access to matchup manifests by key
pub trait DatasetStore {
    /// Fetch the manifest stored under `key`
    fn load(&self, key: &MatchupKey) -> Result<Manifest>;

    /// Store (or replace) the manifest under `key`
    fn save(&self, key: &MatchupKey, manifest: &Manifest) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<MatchupKey>>;
}

/// Message used by every backend when a key is absent
pub fn no_such_key(key: &MatchupKey, location: &str) -> NbaError {
    NbaError::Dependency(format!(
        "NoSuchKey: the specified key does not exist: {}",
        location_for(key, location)
    ))
}

fn location_for(key: &MatchupKey, location: &str) -> String {
    if location.is_empty() {
        key.file_name()
    } else {
        format!("{}/{}", location, key.file_name())
    }
}

/// Object-storage style layout on the local filesystem: `<root>/<prefix>/<key>.json`
pub struct DirectoryStore {
    root: PathBuf,
    prefix: String,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P, prefix: &str) -> Self {
        DirectoryStore {
            root: root.as_ref().to_path_buf(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    fn dir(&self) -> PathBuf {
        if self.prefix.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.prefix)
        }
    }

    fn path_for(&self, key: &MatchupKey) -> PathBuf {
        self.dir().join(key.file_name())
    }
}

impl DatasetStore for DirectoryStore {
    fn load(&self, key: &MatchupKey) -> Result<Manifest> {
        let path = self.path_for(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(no_such_key(key, &self.prefix));
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("Loaded {} ({} bytes)", path.display(), text.len());
        Manifest::from_json(&text)
    }

    fn save(&self, key: &MatchupKey, manifest: &Manifest) -> Result<()> {
        std::fs::create_dir_all(self.dir())?;
        std::fs::write(self.path_for(key), manifest.to_json()?)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<MatchupKey>> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(key) = MatchupKey::parse(stem) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process store, used by tests and for one-shot runs
#[derive(Default)]
pub struct MemoryStore {
    manifests: std::sync::RwLock<BTreeMap<MatchupKey, Manifest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: MatchupKey, manifest: Manifest) -> Self {
        let store = Self::new();
        store.insert(key, manifest);
        store
    }

    pub fn insert(&self, key: MatchupKey, manifest: Manifest) {
        let mut manifests = self.manifests.write().unwrap_or_else(|e| e.into_inner());
        manifests.insert(key, manifest);
    }
}

impl DatasetStore for MemoryStore {
    fn load(&self, key: &MatchupKey) -> Result<Manifest> {
        let manifests = self.manifests.read().unwrap_or_else(|e| e.into_inner());
        manifests
            .get(key)
            .cloned()
            .ok_or_else(|| no_such_key(key, ""))
    }

    fn save(&self, key: &MatchupKey, manifest: &Manifest) -> Result<()> {
        self.insert(key.clone(), manifest.clone());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<MatchupKey>> {
        let manifests = self.manifests.read().unwrap_or_else(|e| e.into_inner());
        Ok(manifests.keys().cloned().collect())
    }
}
