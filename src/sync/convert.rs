//! Convert match-detail payloads into canonical rows.
//!
//! Bridges between the API document shape ([`MatchPayload`]) and the flat
//! per-match row ([`CanonicalRow`]) that the stats table stores.

use thiserror::Error;

use crate::models::{
    CanonicalRow, MatchId, MatchPayload, Objective, Participant, PerkStyle, Puuid, Team,
};

/// Errors raised while flattening a match payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The tracked player is not among the match participants.
    #[error("Player {puuid} is not a participant of match {match_id}")]
    PlayerNotInMatch { match_id: MatchId, puuid: Puuid },

    /// A substructure every ranked match carries is absent.
    #[error("Match payload is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Flatten one match into the tracked player's row.
///
/// Returns `Ok(None)` when `map_filter` is set and the match was played on a
/// different map (or reports no map at all).
pub fn extract(
    payload: &MatchPayload,
    player: &Puuid,
    map_filter: Option<i64>,
) -> Result<Option<CanonicalRow>, ExtractError> {
    if let Some(map) = map_filter {
        if payload.info.map_id != Some(map) {
            return Ok(None);
        }
    }

    let match_id = &payload.metadata.match_id;

    let identities = payload
        .metadata
        .participants
        .as_ref()
        .ok_or(ExtractError::MissingField("metadata.participants"))?;

    let idx = identities
        .iter()
        .position(|p| p == player)
        .ok_or_else(|| ExtractError::PlayerNotInMatch {
            match_id: match_id.clone(),
            puuid: player.clone(),
        })?;

    let participant = payload
        .info
        .participants
        .as_ref()
        .and_then(|ps| ps.get(idx))
        .ok_or(ExtractError::MissingField("info.participants"))?;

    let teams = payload
        .info
        .teams
        .as_ref()
        .ok_or(ExtractError::MissingField("info.teams"))?;
    let team = player_team(participant, teams)?;

    let mut row = CanonicalRow::new(match_id.clone());
    row.patch = payload.info.game_version.as_deref().and_then(patch_from_version);

    fill_identity(&mut row, participant);
    fill_challenges(&mut row, participant);
    fill_objectives(&mut row, team)?;
    fill_runes(&mut row, participant);

    Ok(Some(row))
}

/// Major.minor patch from a full client version: `"14.14.604.1234"` → `"14.14"`.
pub fn patch_from_version(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next().filter(|s| !s.is_empty())?;
    let minor = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{}.{}", major, minor))
}

fn player_team<'a>(participant: &Participant, teams: &'a [Team]) -> Result<&'a Team, ExtractError> {
    let team_id = participant
        .team_id
        .ok_or(ExtractError::MissingField("info.participants[].teamId"))?;

    teams
        .iter()
        .find(|t| t.team_id == Some(team_id))
        .ok_or(ExtractError::MissingField("info.teams[].teamId"))
}

fn fill_identity(row: &mut CanonicalRow, p: &Participant) {
    row.champion = p.champion_name.clone();
    row.role = p.team_position.clone();
    row.win = p.win;
    row.summoner1 = p.summoner1_id;
    row.summoner2 = p.summoner2_id;

    row.turrets_killed = p.turret_takedowns;
    row.total_minions_killed = p.total_minions_killed;
    row.total_jungle_monsters_killed = match (
        p.total_ally_jungle_minions_killed,
        p.total_enemy_jungle_minions_killed,
    ) {
        (None, None) => None,
        (ally, enemy) => Some(ally.unwrap_or(0) + enemy.unwrap_or(0)),
    };
    row.total_damage_dealt_to_champions = p.total_damage_dealt_to_champions;

    row.items = p.items();
}

fn fill_challenges(row: &mut CanonicalRow, p: &Participant) {
    // Older patches carry no challenges block at all.
    let Some(c) = p.challenges.as_ref() else {
        return;
    };

    row.kda = c.kda;
    row.kill_participation = c.kill_participation;
    row.damage_share = c.team_damage_percentage;
    row.turret_plates_taken = c.turret_plates_taken;
    row.gold_per_minute = c.gold_per_minute;
    row.damage_per_minute = c.damage_per_minute;
    row.vision_score_per_minute = c.vision_score_per_minute;
    row.lane_minions_before_10_minutes = c.lane_minions_first10_minutes;
    row.jungle_cs_before_10_minutes = c.jungle_cs_before10_minutes;
    row.solo_kills = c.solo_kills;
}

fn fill_objectives(row: &mut CanonicalRow, team: &Team) -> Result<(), ExtractError> {
    let objectives = team
        .objectives
        .as_ref()
        .ok_or(ExtractError::MissingField("info.teams[].objectives"))?;

    let kills = |o: &Option<Objective>| o.as_ref().and_then(|o| o.kills);
    row.barons_killed = kills(&objectives.baron);
    row.dragons_killed = kills(&objectives.dragon);
    row.void_grubs_killed = kills(&objectives.horde);
    row.rift_heralds_killed = kills(&objectives.rift_herald);
    Ok(())
}

fn fill_runes(row: &mut CanonicalRow, p: &Participant) {
    let Some(perks) = p.perks.as_ref() else {
        return;
    };

    if let Some(stats) = perks.stat_perks.as_ref() {
        row.defense_rune = stats.defense;
        row.flex_rune = stats.flex;
        row.offense_rune = stats.offense;
    }

    let styles: &[PerkStyle] = perks.styles.as_deref().unwrap_or_default();

    if let Some(primary) = styles.first() {
        row.primary_tree = primary.style;
        row.primary_keystone = primary.perk_at(0);
        row.primary_choice1 = primary.perk_at(1);
        row.primary_choice2 = primary.perk_at(2);
        row.primary_choice3 = primary.perk_at(3);
    }

    if let Some(secondary) = styles.get(1) {
        row.secondary_tree = secondary.style;
        row.secondary_choice1 = secondary.perk_at(0);
        row.secondary_choice2 = secondary.perk_at(1);
    }
}
