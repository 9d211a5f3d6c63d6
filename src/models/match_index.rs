//! Persisted bookkeeping of which matches have been seen.

use serde::{Deserialize, Serialize};

use super::MatchId;

/// Ordered list of known matches, newest first.
///
/// `latest` is the creation time (epoch seconds) of `matchlist[0]` as it was
/// when the index was last saved. It is the `startTime` handed to the next
/// incremental fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchIndex {
    pub latest: i64,
    pub matchlist: Vec<MatchId>,
}

impl MatchIndex {
    pub fn new(latest: i64, matchlist: Vec<MatchId>) -> Self {
        Self { latest, matchlist }
    }

    /// True for an index produced by first-time setup and never filled.
    pub fn is_fresh(&self) -> bool {
        self.latest == 0 && self.is_empty()
    }

    pub fn most_recent(&self) -> Option<&MatchId> {
        self.matchlist.first()
    }

    pub fn contains(&self, id: &MatchId) -> bool {
        self.matchlist.contains(id)
    }

    pub fn len(&self) -> usize {
        self.matchlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchlist.is_empty()
    }

    /// The first `n` entries, i.e. the `n` most recently discovered matches.
    pub fn newest(&self, n: usize) -> &[MatchId] {
        &self.matchlist[..n.min(self.matchlist.len())]
    }
}
