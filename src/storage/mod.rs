//! Local data directory operations.
//!
//! Everything the tracker persists lives under one data directory:
//! - `player.json`: the tracked player's identity
//! - `matches.json`: the match index
//! - `stats.parquet`: the canonical statistics table
//! - `raw/`: cached metadata documents

pub mod match_index;
pub mod parquet;
pub mod player;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use match_index::MatchIndexStore;
pub use parquet::StatDataStore;
pub use player::PlayerStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Corrupt match index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("Unexpected schema in {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn player_path(&self) -> PathBuf {
        self.data_dir.join("player.json")
    }

    pub fn matches_path(&self) -> PathBuf {
        self.data_dir.join("matches.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join("stats.parquet")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Replace `path` with `contents` so that readers see either the old file or
/// the new one, never a partial write.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Sibling temp file used while writing `path`, unique to this process.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.player_path(), PathBuf::from("/data/player.json"));
        assert_eq!(config.matches_path(), PathBuf::from("/data/matches.json"));
        assert_eq!(config.stats_path(), PathBuf::from("/data/stats.parquet"));
        assert_eq!(config.raw_dir(), PathBuf::from("/data/raw"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_tmp_path_is_per_process() {
        assert_eq!(
            tmp_path(Path::new("/data/matches.json")),
            PathBuf::from(format!("/data/matches.json.{}.tmp", std::process::id()))
        );
    }

    #[test]
    fn test_foreign_tmp_file_is_left_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("matches.json");
        // Another process mid-write on the same target.
        let foreign = temp_dir.path().join("matches.json.4294967295.tmp");
        fs::write(&foreign, "partial").unwrap();

        write_atomic(&path, b"ours").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ours");
        assert_eq!(fs::read_to_string(&foreign).unwrap(), "partial");
    }

    #[test]
    fn test_write_atomic_replaces_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("file.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!tmp_path(&path).exists());
    }
}
