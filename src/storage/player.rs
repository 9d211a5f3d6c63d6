//! Storage for the tracked player's identity (`player.json`).

use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::{write_atomic, StorageConfig, StorageError};
use crate::models::PlayerIdentity;

/// Reads and writes `player.json`.
pub struct PlayerStore {
    path: PathBuf,
}

impl PlayerStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.player_path(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the player identity. Fails with `PathNotFound` before `init`.
    pub fn load(&self) -> Result<PlayerIdentity, StorageError> {
        if !self.exists() {
            return Err(StorageError::PathNotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, player: &PlayerIdentity) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(player)?;
        write_atomic(&self.path, &json)?;
        info!("Saved player {} to {:?}", player.riot_id, self.path);
        Ok(())
    }
}
