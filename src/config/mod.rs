//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::cache::DocumentCacheConfig;
use crate::fetch::{regional_base_url, RiotClientConfig};
use crate::storage::StorageConfig;
use crate::sync::discovery::MAX_BATCH_SIZE;
use crate::sync::SyncConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("No API key: pass --api-key or set {0}")]
    MissingApiKey(String),
}

/// Riot API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Regional routing host prefix, e.g. "americas" or "europe"
    #[serde(default = "default_region")]
    pub region: String,

    /// Full base URL; overrides `region` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Wait applied to a 429 without `Retry-After`
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,

    /// Give up after this many consecutive 429s; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rate_limit_retries: Option<u32>,

    /// Match ids requested per page
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Map id to keep (11 is Summoner's Rift); 0 keeps every map
    #[serde(default = "default_map_filter")]
    pub map_filter: i64,
}

fn default_region() -> String {
    "americas".to_string()
}

fn default_api_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_after() -> u64 {
    10
}

fn default_batch_size() -> u32 {
    MAX_BATCH_SIZE
}

fn default_map_filter() -> i64 {
    11
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            base_url: None,
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
            default_retry_after_secs: default_retry_after(),
            max_rate_limit_retries: None,
            batch_size: default_batch_size(),
            map_filter: default_map_filter(),
        }
    }
}

/// Rune and item catalogue sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_perks_url")]
    pub perks_url: String,

    #[serde(default = "default_items_url")]
    pub items_url: String,

    /// How long a cached catalogue stays fresh
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
}

fn default_perks_url() -> String {
    "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default/v1/perks.json"
        .to_string()
}

fn default_items_url() -> String {
    "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default/v1/items.json"
        .to_string()
}

fn default_cache_ttl_hours() -> u64 {
    24
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            perks_url: default_perks_url(),
            items_url: default_items_url(),
            cache_ttl_hours: default_cache_ttl_hours(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            riot: RiotConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.riot.batch_size) {
            return Err(ConfigError::ValidationError(format!(
                "riot.batch_size must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }

        if self.riot.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "riot.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.metadata.cache_ttl_hours == 0 {
            return Err(ConfigError::ValidationError(
                "metadata.cache_ttl_hours must be greater than 0".to_string(),
            ));
        }

        if self.riot.base_url.is_none() && self.riot.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "riot.region is required when riot.base_url is not set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            storage: self.storage(),
            batch_size: self.riot.batch_size,
            map_filter: (self.riot.map_filter != 0).then_some(self.riot.map_filter),
        }
    }

    /// Client settings for `region`, unless `riot.base_url` pins the host.
    pub fn riot_client_config(&self, region: &str, api_key: String) -> RiotClientConfig {
        RiotClientConfig {
            base_url: self
                .riot
                .base_url
                .clone()
                .unwrap_or_else(|| regional_base_url(region)),
            api_key,
            timeout: Duration::from_secs(self.riot.timeout_seconds),
            default_retry_after: Duration::from_secs(self.riot.default_retry_after_secs),
            max_rate_limit_retries: self.riot.max_rate_limit_retries,
        }
    }

    pub fn document_cache_config(&self) -> DocumentCacheConfig {
        DocumentCacheConfig {
            cache_dir: self.storage().raw_dir(),
            cache_ttl: Duration::from_secs(self.metadata.cache_ttl_hours * 3600),
            ..Default::default()
        }
    }

    /// The explicit key if given, else the one in `riot.api_key_env`.
    pub fn resolve_api_key(&self, explicit: Option<String>) -> Result<String, ConfigError> {
        explicit
            .or_else(|| std::env::var(&self.riot.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.riot.api_key_env.clone()))
    }
}
