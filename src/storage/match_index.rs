//! Durable storage for the match index (`matches.json`).

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info};

use super::{write_atomic, StorageConfig, StorageError};
use crate::models::MatchIndex;

/// Reads and writes the match index file.
pub struct MatchIndexStore {
    path: PathBuf,
}

impl MatchIndexStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.matches_path(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write an empty index, replacing any existing one.
    pub fn initialize(&self) -> Result<MatchIndex, StorageError> {
        let index = MatchIndex::default();
        self.save(&index)?;
        info!("Initialized empty match index at {:?}", self.path);
        Ok(index)
    }

    /// Load the index.
    ///
    /// A missing file is an empty index. A file that exists but lacks either
    /// `latest` or `matchlist` is corrupt.
    pub fn load(&self) -> Result<MatchIndex, StorageError> {
        if !self.exists() {
            debug!("No match index at {:?}, starting empty", self.path);
            return Ok(MatchIndex::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;

        for key in ["latest", "matchlist"] {
            if value.get(key).is_none() {
                return Err(self.corrupt(format!("missing field `{}`", key)));
            }
        }

        let index: MatchIndex = serde_json::from_value(value).map_err(|e| self.corrupt(e))?;
        debug!(
            "Loaded match index with {} matches (latest {})",
            index.len(),
            index.latest
        );
        Ok(index)
    }

    /// Replace the index file atomically.
    pub fn save(&self, index: &MatchIndex) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(index)?;
        write_atomic(&self.path, &json)?;
        debug!("Saved match index with {} matches", index.len());
        Ok(())
    }

    fn corrupt(&self, reason: impl ToString) -> StorageError {
        StorageError::CorruptIndex {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchId;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> MatchIndexStore {
        MatchIndexStore::new(&StorageConfig::new(temp_dir.path().to_path_buf()))
    }

    #[test]
    fn test_missing_file_is_empty_index() {
        let temp_dir = TempDir::new().unwrap();
        let index = store(&temp_dir).load().unwrap();
        assert!(index.is_fresh());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let index = MatchIndex {
            latest: 1_721_000_000,
            matchlist: vec![MatchId::from("NA1_3"), MatchId::from("NA1_2")],
        };
        store.save(&index).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .save(&MatchIndex {
                latest: 5,
                matchlist: vec![MatchId::from("NA1_1")],
            })
            .unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "latest": 5, "matchlist": ["NA1_1"] }));
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        fs::write(store.path(), r#"{"matchlist": []}"#).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, StorageError::CorruptIndex { .. }));
        assert!(err.to_string().contains("latest"));

        fs::write(store.path(), r#"{"latest": 0}"#).unwrap();
        assert!(matches!(
            store.load(),
            Err(StorageError::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_unparseable_file_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.load(),
            Err(StorageError::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_initialize_resets_existing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .save(&MatchIndex {
                latest: 9,
                matchlist: vec![MatchId::from("NA1_9")],
            })
            .unwrap();

        let created = store.initialize().unwrap();
        assert!(created.is_fresh());
        assert!(store.load().unwrap().is_fresh());
    }
}
