//! Match-detail document as returned by the match API.
//!
//! Only the fields the statistics pipeline reads are modelled. Every leaf is
//! optional: the API omits fields for older patches and other game modes, and
//! an absent value must stay distinguishable from zero.

use serde::{Deserialize, Serialize};

use super::{MatchId, Puuid};

/// Full match-detail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: MatchId,

    /// Participant PUUIDs, in the same order as `info.participants`
    pub participants: Option<Vec<Puuid>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// Creation time in epoch milliseconds
    pub game_creation: Option<i64>,

    /// Full client version, e.g. `14.14.604.1234`
    pub game_version: Option<String>,

    /// 11 = Summoner's Rift, 12 = Howling Abyss
    pub map_id: Option<i64>,

    pub participants: Option<Vec<Participant>>,

    pub teams: Option<Vec<Team>>,
}

impl MatchInfo {
    /// Creation time in epoch seconds.
    pub fn creation_secs(&self) -> Option<i64> {
        self.game_creation.map(|ms| ms / 1000)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub puuid: Option<Puuid>,
    pub champion_name: Option<String>,

    /// TOP, JUNGLE, MIDDLE, BOTTOM, UTILITY, or empty for remakes
    pub team_position: Option<String>,

    pub win: Option<bool>,
    pub team_id: Option<i64>,
    pub summoner1_id: Option<i64>,
    pub summoner2_id: Option<i64>,

    pub turret_takedowns: Option<i64>,
    pub total_minions_killed: Option<i64>,
    pub total_ally_jungle_minions_killed: Option<i64>,
    pub total_enemy_jungle_minions_killed: Option<i64>,
    pub total_damage_dealt_to_champions: Option<i64>,

    pub item0: Option<i64>,
    pub item1: Option<i64>,
    pub item2: Option<i64>,
    pub item3: Option<i64>,
    pub item4: Option<i64>,
    pub item5: Option<i64>,
    pub item6: Option<i64>,

    pub challenges: Option<Challenges>,
    pub perks: Option<Perks>,
}

impl Participant {
    /// Item slots 0..=6 in order.
    pub fn items(&self) -> [Option<i64>; 7] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5, self.item6,
        ]
    }
}

/// Server-computed per-match statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenges {
    pub kda: Option<f64>,
    pub kill_participation: Option<f64>,
    pub team_damage_percentage: Option<f64>,
    pub turret_plates_taken: Option<f64>,
    pub gold_per_minute: Option<f64>,
    pub damage_per_minute: Option<f64>,
    pub vision_score_per_minute: Option<f64>,
    pub lane_minions_first10_minutes: Option<f64>,
    pub jungle_cs_before10_minutes: Option<f64>,
    pub solo_kills: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perks {
    pub stat_perks: Option<StatPerks>,

    /// `[primary, secondary]` rune pages
    pub styles: Option<Vec<PerkStyle>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatPerks {
    pub defense: Option<i64>,
    pub flex: Option<i64>,
    pub offense: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerkStyle {
    /// Rune tree id (8000 Precision, 8100 Domination, ...)
    pub style: Option<i64>,
    pub selections: Option<Vec<PerkSelection>>,
}

impl PerkStyle {
    /// Perk id chosen at `slot`, if the page has that many selections.
    pub fn perk_at(&self, slot: usize) -> Option<i64> {
        self.selections
            .as_ref()
            .and_then(|s| s.get(slot))
            .and_then(|s| s.perk)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerkSelection {
    pub perk: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: Option<i64>,
    pub objectives: Option<Objectives>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objectives {
    pub baron: Option<Objective>,
    pub dragon: Option<Objective>,

    /// Void grubs
    pub horde: Option<Objective>,

    pub rift_herald: Option<Objective>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Objective {
    pub kills: Option<i64>,
}
