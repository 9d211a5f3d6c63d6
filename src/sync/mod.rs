//! Update orchestrator.
//!
//! Coordinates the ingestion pipeline:
//! 1. Refresh the match index from the match-id endpoint
//! 2. Fetch detail for each newly discovered match, oldest first
//! 3. Flatten each match into a canonical row
//! 4. Persist the stats table and the match index
//!
//! Step 4 always runs, even when step 2 or 3 fails or the run deadline
//! expires; the failure is carried in the returned [`UpdateReport`].

pub mod convert;
pub mod discovery;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::fetch::{FetchError, MatchApi};
use crate::models::{CanonicalRow, MatchId, MatchIndex, PlayerIdentity, RiotId, StatTable};
use crate::storage::{MatchIndexStore, PlayerStore, StatDataStore, StorageConfig, StorageError};

pub use convert::{extract, ExtractError};
pub use discovery::IncrementalFetcher;

/// Errors that can occur during sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Update timed out after {limit:?}")]
    TimedOut { limit: Duration },
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Page size for the match-id endpoint (1..=100)
    pub batch_size: u32,

    /// Only keep matches played on this map; `None` keeps everything
    pub map_filter: Option<i64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            batch_size: discovery::MAX_BATCH_SIZE,
            map_filter: Some(11),
        }
    }
}

/// Per-run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Discard the stored index and table and rebuild from full history
    pub fresh: bool,

    /// Stop processing matches once this much time has passed
    pub deadline: Option<Duration>,
}

/// Outcome of one update run.
///
/// Whatever was processed before `failure` has already been persisted.
#[derive(Debug)]
pub struct UpdateReport {
    /// Matches added to the index by this run
    pub new_matches: usize,

    /// Matches whose detail was fetched and flattened
    pub matches_processed: usize,

    /// Rows added to the stats table
    pub rows_appended: usize,

    /// Rows in the stats table after the run
    pub total_rows: usize,

    /// The error that cut the run short, if any
    pub failure: Option<SyncError>,
}

impl UpdateReport {
    fn unchanged(total_rows: usize) -> Self {
        Self {
            new_matches: 0,
            matches_processed: 0,
            rows_appended: 0,
            total_rows,
            failure: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Surface the failure, if any, now that persistence has happened.
    pub fn into_result(self) -> Result<Self, SyncError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Resolve a Riot ID and reset local state for that player.
///
/// Writes `player.json`, an empty match index, and removes any previous stats
/// table. The caller follows up with a fresh [`UpdateOrchestrator::update`].
pub async fn register_player(
    api: &dyn MatchApi,
    storage: &StorageConfig,
    riot_id: RiotId,
    region: &str,
) -> Result<PlayerIdentity, SyncError> {
    info!("Looking up {}", riot_id);
    let puuid = api.account_puuid(&riot_id).await?;
    let player = PlayerIdentity::new(riot_id, puuid, region);

    PlayerStore::new(storage).save(&player)?;
    MatchIndexStore::new(storage).initialize()?;
    StatDataStore::new(storage).clear()?;

    Ok(player)
}

/// Update orchestrator for one tracked player.
pub struct UpdateOrchestrator {
    config: SyncConfig,
    api: Arc<dyn MatchApi>,
    player: PlayerIdentity,
}

impl UpdateOrchestrator {
    /// Create a new update orchestrator.
    pub fn new(config: SyncConfig, api: Arc<dyn MatchApi>, player: PlayerIdentity) -> Self {
        Self {
            config,
            api,
            player,
        }
    }

    /// Run one update.
    ///
    /// `Err` means nothing was written: the index could not be loaded or
    /// refreshed, or the final save failed. A failure while processing
    /// individual matches is returned inside the report instead, after the
    /// rows gathered so far and the refreshed index have been saved.
    pub async fn update(&self, options: UpdateOptions) -> Result<UpdateReport, SyncError> {
        let index_store = MatchIndexStore::new(&self.config.storage);
        let stat_store = StatDataStore::new(&self.config.storage);

        let mut index = if options.fresh {
            MatchIndex::default()
        } else {
            index_store.load()?
        };
        let fresh = index.is_fresh();

        info!(
            "Starting {} update for {}",
            if fresh { "full" } else { "incremental" },
            self.player.riot_id
        );

        let discovery = IncrementalFetcher::new(
            self.api.clone(),
            self.player.puuid.clone(),
            self.config.batch_size,
        );
        let new_matches = discovery.refresh(&mut index).await?;

        if new_matches == 0 && !fresh {
            info!("Already up to date");
            return Ok(UpdateReport::unchanged(stat_store.load()?.len()));
        }

        let mut table = if fresh {
            StatTable::new()
        } else {
            stat_store.load()?
        };

        let pending = index.newest(new_matches).to_vec();
        let (rows, processed, failure) = self.process_pending(&pending, options.deadline).await;

        if let Some(ref e) = failure {
            error!(
                "Update stopped after {} of {} matches: {}",
                processed,
                pending.len(),
                e
            );
        }

        // Rows were gathered oldest first; the table is newest first.
        let mut rows = rows;
        rows.reverse();
        let rows_appended = rows.len();
        table.append(rows);

        stat_store.save(&table)?;
        index_store.save(&index)?;

        info!(
            "Update finished: {} new matches, {} rows appended, {} rows total",
            new_matches,
            rows_appended,
            table.len()
        );

        Ok(UpdateReport {
            new_matches,
            matches_processed: processed,
            rows_appended,
            total_rows: table.len(),
            failure,
        })
    }

    /// Fetch and flatten `pending` (newest first) from oldest to newest,
    /// stopping at the first failure.
    async fn process_pending(
        &self,
        pending: &[MatchId],
        limit: Option<Duration>,
    ) -> (Vec<CanonicalRow>, usize, Option<SyncError>) {
        let deadline = limit.map(|d| (Instant::now() + d, d));
        let mut rows = Vec::with_capacity(pending.len());
        let mut processed = 0;

        for (i, id) in pending.iter().rev().enumerate() {
            let result = match deadline {
                Some((at, limit)) => {
                    if Instant::now() >= at {
                        Err(SyncError::TimedOut { limit })
                    } else {
                        tokio::time::timeout_at(at, self.process_match(id))
                            .await
                            .unwrap_or(Err(SyncError::TimedOut { limit }))
                    }
                }
                None => self.process_match(id).await,
            };

            match result {
                Ok(Some(row)) => {
                    info!("Processed match {} ({}/{})", id, i + 1, pending.len());
                    rows.push(row);
                }
                Ok(None) => debug!("Skipped match {} (map filter)", id),
                Err(e) => return (rows, processed, Some(e)),
            }
            processed += 1;
        }

        (rows, processed, None)
    }

    async fn process_match(&self, id: &MatchId) -> Result<Option<CanonicalRow>, SyncError> {
        let payload = self.api.match_detail(id).await?;
        if &payload.metadata.match_id != id {
            warn!(
                "Requested match {} but the payload is for {}",
                id, payload.metadata.match_id
            );
        }
        Ok(extract(&payload, &self.player.puuid, self.config.map_filter)?)
    }
}
