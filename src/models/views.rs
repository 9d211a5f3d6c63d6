//! Derived statistics views.
//!
//! Every row here is complete: the aggregation engine drops any grouped row
//! that would have had a missing or empty value before it reaches these
//! types.

use serde::{Deserialize, Serialize};

/// Mean objective control per champion, role and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveControlRow {
    pub champion: String,
    pub role: String,
    pub win: bool,
    pub barons_killed: f64,
    pub void_grubs_killed: f64,
    pub dragons_killed: f64,
    pub turrets_killed: f64,
    pub rift_heralds_killed: f64,
}

/// Winrate and games played per champion and role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinrateRow {
    pub champion: String,
    pub role: String,
    pub winrate: f64,
    pub games_played: u32,
}

/// Mean farm, combat and vision statistics per champion, role and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessRow {
    pub champion: String,
    pub role: String,
    pub win: bool,
    pub total_minions_killed: f64,
    pub total_jungle_monsters_killed: f64,
    pub total_damage_dealt_to_champions: f64,
    pub kda: f64,
    pub kill_participation: f64,
    pub damage_share: f64,
    pub turret_plates_taken: f64,
    pub gold_per_minute: f64,
    pub damage_per_minute: f64,
    pub vision_score_per_minute: f64,
    pub lane_minions_before_10_minutes: f64,
    pub jungle_cs_before_10_minutes: f64,
    pub solo_kills: f64,
}

/// Winrate by primary/secondary rune tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuneTreeRow {
    pub champion: String,
    pub role: String,
    pub primary_tree: String,
    pub secondary_tree: String,
    pub winrate: f64,
    pub games_played: u32,
}

/// Winrate by keystone and secondary tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystoneRow {
    pub champion: String,
    pub role: String,
    pub primary_keystone: String,
    pub secondary_tree: String,
    pub winrate: f64,
    pub games_played: u32,

    /// `winrate * games_played`, ranks pages that win often *and* get played
    pub score: f64,
}

/// Winrate of games in which a finished item was held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWinrateRow {
    pub champion: String,
    pub item: String,
    pub winrate: f64,
    pub games_played: u32,
}

/// All six views, computed together from one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedViews {
    pub objective_control: Vec<ObjectiveControlRow>,
    pub winrate_by_role: Vec<WinrateRow>,
    pub effectiveness: Vec<EffectivenessRow>,
    pub rune_trees: Vec<RuneTreeRow>,
    pub rune_keystones: Vec<KeystoneRow>,
    pub item_winrates: Vec<ItemWinrateRow>,
}

/// The six views narrowed to one champion and role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChampionData {
    pub champion: String,
    pub role: String,
    pub objective_control: Vec<ObjectiveControlRow>,
    pub winrate_by_role: Vec<WinrateRow>,
    pub effectiveness: Vec<EffectivenessRow>,
    pub rune_trees: Vec<RuneTreeRow>,
    pub rune_keystones: Vec<KeystoneRow>,
    pub item_winrates: Vec<ItemWinrateRow>,
}

impl ChampionData {
    /// True when no match for this champion and role survived aggregation.
    pub fn is_empty(&self) -> bool {
        self.objective_control.is_empty()
            && self.winrate_by_role.is_empty()
            && self.effectiveness.is_empty()
            && self.rune_trees.is_empty()
            && self.rune_keystones.is_empty()
            && self.item_winrates.is_empty()
    }
}

/// One recommended rune page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunepagePick {
    pub keystone: String,
    pub secondary_tree: String,
    pub winrate: f64,
    pub games_played: u32,
}

impl From<&KeystoneRow> for RunepagePick {
    fn from(row: &KeystoneRow) -> Self {
        Self {
            keystone: row.primary_keystone.clone(),
            secondary_tree: row.secondary_tree.clone(),
            winrate: row.winrate,
            games_played: row.games_played,
        }
    }
}

/// Best rune pages by three different criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunepageRecommendations {
    pub by_winrate: RunepagePick,
    pub by_score: RunepagePick,
    pub by_games: RunepagePick,
}
