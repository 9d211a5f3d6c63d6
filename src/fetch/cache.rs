//! Disk-cached fetching of static game metadata documents.
//!
//! Rune and item catalogues change once per patch, so they are fetched once
//! and served from `raw/` until their entry expires. An entry is a pair of
//! files under `raw/<host>/`: the document itself and a `.meta.json` sidecar
//! recording when it expires.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use super::FetchError;
use crate::storage::write_atomic;

/// Sidecar describing one cached document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheMetadata {
    fn new(url: &Url, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            url: url.to_string(),
            fetched_at,
            expires_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Configuration for the document cache.
#[derive(Debug, Clone)]
pub struct DocumentCacheConfig {
    /// Directory holding cached documents
    pub cache_dir: PathBuf,

    /// Lifetime given to a newly fetched document
    pub cache_ttl: Duration,

    /// Largest document accepted (default 50MB)
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for DocumentCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/raw"),
            cache_ttl: Duration::from_secs(24 * 3600),
            max_content_size: 50 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: concat!("rift-ledger/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// JSON documents fetched over HTTP and kept on disk until they expire.
pub struct DocumentCache {
    client: Client,
    config: DocumentCacheConfig,
}

impl DocumentCache {
    pub fn new(config: DocumentCacheConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("rift-ledger")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// The document at `url`, from disk while its entry is unexpired and
    /// downloaded otherwise.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        if let Some(value) = self.fresh_entry(url, Utc::now()).await {
            debug!("Serving {} from cache", url);
            return Ok(value);
        }
        self.download(url).await
    }

    /// The cached copy regardless of age, if there is one.
    pub async fn cached_json(&self, url: &Url) -> Option<Value> {
        let bytes = fs::read(self.document_path(url)).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn fresh_entry(&self, url: &Url, now: DateTime<Utc>) -> Option<Value> {
        let meta = fs::read(self.meta_path(url)).await.ok()?;
        let meta: CacheMetadata = serde_json::from_slice(&meta).ok()?;
        if !meta.is_fresh(now) {
            debug!("Cache entry for {} expired at {}", url, meta.expires_at);
            return None;
        }
        self.cached_json(url).await
    }

    async fn download(&self, url: &Url) -> Result<Value, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        if body.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: body.len(),
                max_size: self.config.max_content_size,
            });
        }

        // Parse before touching disk; a bad download must not replace a good entry.
        let value: Value = serde_json::from_slice(&body)?;
        self.store(url, &body, Utc::now())?;
        Ok(value)
    }

    /// Write `body` as the entry for `url`, expiring one TTL after `fetched_at`.
    pub(crate) fn store(
        &self,
        url: &Url,
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), FetchError> {
        let meta = CacheMetadata::new(url, fetched_at, self.config.cache_ttl);
        write_atomic(&self.document_path(url), body)?;
        write_atomic(&self.meta_path(url), &serde_json::to_vec_pretty(&meta)?)?;
        Ok(())
    }

    fn document_path(&self, url: &Url) -> PathBuf {
        self.entry_dir(url).join(format!("{}.json", cache_key(url)))
    }

    fn meta_path(&self, url: &Url) -> PathBuf {
        self.entry_dir(url).join(format!("{}.meta.json", cache_key(url)))
    }

    fn entry_dir(&self, url: &Url) -> PathBuf {
        self.config.cache_dir.join(url.host_str().unwrap_or("unknown"))
    }
}

/// First 8 bytes of the URL's SHA-256, hex encoded.
fn cache_key(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    hex::encode(&digest[..8])
}
