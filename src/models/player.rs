//! Tracked player identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Puuid;

/// Human-readable `gameName#tagLine` handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl FromStr for RiotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tag) = s
            .split_once('#')
            .ok_or_else(|| format!("Riot ID must look like name#tag, got {:?}", s))?;
        let name = name.trim();
        let tag = tag.trim();
        if name.is_empty() || tag.is_empty() {
            return Err(format!("Riot ID has an empty name or tag: {:?}", s));
        }
        Ok(Self {
            game_name: name.to_string(),
            tag_line: tag.to_string(),
        })
    }
}

impl TryFrom<String> for RiotId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RiotId> for String {
    fn from(id: RiotId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

/// The single player whose history is tracked.
///
/// Written once by `init`; every update reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub riot_id: RiotId,
    pub puuid: Puuid,
    pub region: String,
}

impl PlayerIdentity {
    pub fn new(riot_id: RiotId, puuid: Puuid, region: impl Into<String>) -> Self {
        Self {
            riot_id,
            puuid,
            region: region.into(),
        }
    }
}
