//! Opaque identifiers handed out by the match API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A match identifier such as `NA1_5012345678`.
///
/// Only the API knows how these order; within a fetched batch they arrive
/// newest first.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.0)
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable player identifier returned by the account lookup.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Puuid(String);

impl Puuid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Puuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Puuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Puuid({})", self.0)
    }
}

impl From<&str> for Puuid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_serializes_as_plain_string() {
        let id = MatchId::from("NA1_123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"NA1_123\"");

        let parsed: MatchId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_match_id_display() {
        let id = MatchId::new("NA1_42");
        assert_eq!(format!("{}", id), "NA1_42");
    }

    #[test]
    fn test_match_id_debug() {
        let id = MatchId::new("debug-test");
        assert!(format!("{:?}", id).contains("debug-test"));
    }

    #[test]
    fn test_puuid_equality() {
        let a = Puuid::from("same");
        let b = Puuid::new("same".to_string());
        let c = Puuid::from("different");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
