//! Canonical per-match statistics row and the table that accumulates them.

use serde::{Deserialize, Serialize};

use super::MatchId;

/// Number of item slots on a participant (six inventory slots plus trinket).
pub const ITEM_SLOTS: usize = 7;

/// One tracked player's statistics for one match.
///
/// `None` means the API did not report the value; zero is a real count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub match_id: MatchId,

    // Identity
    pub champion: Option<String>,
    pub role: Option<String>,
    pub patch: Option<String>,
    pub win: Option<bool>,
    pub summoner1: Option<i64>,
    pub summoner2: Option<i64>,

    // Farm and structures
    pub turrets_killed: Option<i64>,
    pub total_minions_killed: Option<i64>,
    pub total_jungle_monsters_killed: Option<i64>,
    pub total_damage_dealt_to_champions: Option<i64>,

    pub items: [Option<i64>; ITEM_SLOTS],

    // Challenge-derived rates
    pub kda: Option<f64>,
    pub kill_participation: Option<f64>,
    pub damage_share: Option<f64>,
    pub turret_plates_taken: Option<f64>,
    pub gold_per_minute: Option<f64>,
    pub damage_per_minute: Option<f64>,
    pub vision_score_per_minute: Option<f64>,
    pub lane_minions_before_10_minutes: Option<f64>,
    pub jungle_cs_before_10_minutes: Option<f64>,
    pub solo_kills: Option<f64>,

    // Objective control for the player's team
    pub barons_killed: Option<i64>,
    pub dragons_killed: Option<i64>,
    pub void_grubs_killed: Option<i64>,
    pub rift_heralds_killed: Option<i64>,

    // Runes
    pub defense_rune: Option<i64>,
    pub flex_rune: Option<i64>,
    pub offense_rune: Option<i64>,
    pub primary_tree: Option<i64>,
    pub primary_keystone: Option<i64>,
    pub primary_choice1: Option<i64>,
    pub primary_choice2: Option<i64>,
    pub primary_choice3: Option<i64>,
    pub secondary_tree: Option<i64>,
    pub secondary_choice1: Option<i64>,
    pub secondary_choice2: Option<i64>,
}

impl CanonicalRow {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            ..Default::default()
        }
    }
}

/// Every canonical row gathered so far, newest match first.
///
/// Row order mirrors the match index so that `rows[0]` belongs to the most
/// recently played match that produced a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    rows: Vec<CanonicalRow>,
}

impl StatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<CanonicalRow>) -> Self {
        Self { rows }
    }

    /// Add rows that are newer than everything already held.
    ///
    /// `newest_first` must itself be ordered newest first; the rows end up
    /// ahead of the existing ones.
    pub fn append(&mut self, newest_first: Vec<CanonicalRow>) {
        if newest_first.is_empty() {
            return;
        }
        let mut rows = newest_first;
        rows.append(&mut self.rows);
        self.rows = rows;
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
