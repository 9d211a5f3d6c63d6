//! Match discovery against the match-id list endpoint.
//!
//! The endpoint pages newest first. A full-history pass walks every page from
//! offset 0; an incremental pass adds `startTime = latest`, which the API
//! treats inclusively, so the previously newest match comes back as the last
//! element and is trimmed before merging.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::convert::ExtractError;
use super::SyncError;
use crate::fetch::{FetchError, MatchApi};
use crate::models::{MatchId, MatchIndex, Puuid};

/// Largest page the match-id endpoint accepts.
pub const MAX_BATCH_SIZE: u32 = 100;

/// Paginated match-id retrieval for one player.
pub struct IncrementalFetcher {
    api: Arc<dyn MatchApi>,
    puuid: Puuid,
    batch_size: u32,
}

impl IncrementalFetcher {
    pub fn new(api: Arc<dyn MatchApi>, puuid: Puuid, batch_size: u32) -> Self {
        Self {
            api,
            puuid,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// One page of ids starting at `start`, newest first.
    pub async fn fetch_batch(
        &self,
        start: u32,
        since: Option<i64>,
    ) -> Result<Vec<MatchId>, FetchError> {
        self.api
            .match_ids(&self.puuid, start, self.batch_size, since)
            .await
    }

    /// Every id the API returns, walking pages until one comes back empty.
    ///
    /// Pages are concatenated in the order received, so the result stays
    /// newest first.
    pub async fn fetch_all(&self, since: Option<i64>) -> Result<Vec<MatchId>, FetchError> {
        let mut all = Vec::new();
        let mut start = 0u32;

        loop {
            let batch = self.fetch_batch(start, since).await?;
            if batch.is_empty() {
                break;
            }
            debug!("Fetched {} match ids at offset {}", batch.len(), start);
            all.extend(batch);
            start += self.batch_size;
        }

        Ok(all)
    }

    /// Bring `index` up to date and return how many new matches were added.
    ///
    /// New ids are prepended, so after a successful refresh the first `n`
    /// entries of `index.matchlist` are exactly the newly discovered matches.
    /// `latest` is reset from one detail lookup of the new newest match. The
    /// index is left untouched when nothing new arrived.
    pub async fn refresh(&self, index: &mut MatchIndex) -> Result<usize, SyncError> {
        let full_history = index.is_fresh();

        let mut fetched = if full_history {
            info!("Fetching full match history");
            self.fetch_all(None).await?
        } else {
            debug!("Fetching matches since {}", index.latest);
            let mut fetched = self.fetch_all(Some(index.latest)).await?;
            if let Some(boundary) = fetched.pop() {
                if index.most_recent() != Some(&boundary) {
                    warn!(
                        "Trimmed {} as the boundary match, but the newest indexed match is {:?}",
                        boundary,
                        index.most_recent()
                    );
                }
            }
            fetched
        };

        let received = fetched.len();
        let mut seen = HashSet::new();
        fetched.retain(|id| !index.contains(id) && seen.insert(id.clone()));
        if fetched.len() < received {
            warn!(
                "Dropped {} match ids that were already indexed",
                received - fetched.len()
            );
        }

        let Some(newest) = fetched.first() else {
            info!("No new matches");
            return Ok(0);
        };

        let detail = self.api.match_detail(newest).await?;
        let latest = detail
            .info
            .creation_secs()
            .ok_or(ExtractError::MissingField("info.gameCreation"))?;

        let new_matches = fetched.len();
        fetched.append(&mut index.matchlist);
        index.matchlist = fetched;
        index.latest = latest;

        info!(
            "Discovered {} new matches ({} total)",
            new_matches,
            index.len()
        );
        Ok(new_matches)
    }
}
