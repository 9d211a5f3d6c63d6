//! Statistics aggregation engine.
//!
//! Computes the six derived views from the stats table:
//! - Objective control and effectiveness by champion, role and outcome
//! - Winrate by champion and role
//! - Rune tree and keystone winrates
//! - Finished-item winrates by champion
//!
//! Every view is recomputed from scratch. Groups whose key contains a missing
//! value are skipped; grouped rows left with an empty or missing value are
//! purged, so every returned field is populated.

pub mod recommend;

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    CanonicalRow, DerivedViews, EffectivenessRow, ItemWinrateRow, KeystoneRow,
    ObjectiveControlRow, RuneTreeRow, StatTable, WinrateRow,
};
use crate::reference::{tree_name, ReferenceMaps};

pub use recommend::best_runepages;

/// Decimal places for objective, winrate, effectiveness and tree views.
pub const VIEW_PRECISION: i32 = 2;

/// Decimal places for the keystone and item views.
pub const FINE_PRECISION: i32 = 4;

/// Compute all six views.
pub fn aggregate(table: &StatTable, refs: &ReferenceMaps) -> DerivedViews {
    let rows = table.rows();
    DerivedViews {
        objective_control: objective_control(rows),
        winrate_by_role: winrate_by_role(rows),
        effectiveness: effectiveness(rows),
        rune_trees: rune_trees(rows),
        rune_keystones: rune_keystones(rows, refs),
        item_winrates: item_winrates(rows, refs),
    }
}

/// Round to `places` decimals, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Mean objective control, grouped by champion, role and outcome.
pub fn objective_control(rows: &[CanonicalRow]) -> Vec<ObjectiveControlRow> {
    let groups = group_by(rows, |r| {
        Some((r.champion.clone()?, r.role.clone()?, r.win?))
    });

    purge("objective control", groups, |(champion, role, win), rows| {
        Some(ObjectiveControlRow {
            champion: non_empty(champion)?,
            role: non_empty(role)?,
            win,
            barons_killed: mean2(&rows, |r| int(r.barons_killed))?,
            void_grubs_killed: mean2(&rows, |r| int(r.void_grubs_killed))?,
            dragons_killed: mean2(&rows, |r| int(r.dragons_killed))?,
            turrets_killed: mean2(&rows, |r| int(r.turrets_killed))?,
            rift_heralds_killed: mean2(&rows, |r| int(r.rift_heralds_killed))?,
        })
    })
}

/// Winrate and games played, grouped by champion and role.
pub fn winrate_by_role(rows: &[CanonicalRow]) -> Vec<WinrateRow> {
    let groups = group_by(rows, |r| Some((r.champion.clone()?, r.role.clone()?)));

    purge("winrate", groups, |(champion, role), rows| {
        let outcomes = Outcomes::of(&rows);
        Some(WinrateRow {
            champion: non_empty(champion)?,
            role: non_empty(role)?,
            winrate: round_to(outcomes.winrate()?, VIEW_PRECISION),
            games_played: outcomes.games,
        })
    })
}

/// Mean farm, combat and vision statistics, grouped by champion, role and
/// outcome.
pub fn effectiveness(rows: &[CanonicalRow]) -> Vec<EffectivenessRow> {
    let groups = group_by(rows, |r| {
        Some((r.champion.clone()?, r.role.clone()?, r.win?))
    });

    purge("effectiveness", groups, |(champion, role, win), rows| {
        Some(EffectivenessRow {
            champion: non_empty(champion)?,
            role: non_empty(role)?,
            win,
            total_minions_killed: mean2(&rows, |r| int(r.total_minions_killed))?,
            total_jungle_monsters_killed: mean2(&rows, |r| int(r.total_jungle_monsters_killed))?,
            total_damage_dealt_to_champions: mean2(&rows, |r| {
                int(r.total_damage_dealt_to_champions)
            })?,
            kda: mean2(&rows, |r| r.kda)?,
            kill_participation: mean2(&rows, |r| r.kill_participation)?,
            damage_share: mean2(&rows, |r| r.damage_share)?,
            turret_plates_taken: mean2(&rows, |r| r.turret_plates_taken)?,
            gold_per_minute: mean2(&rows, |r| r.gold_per_minute)?,
            damage_per_minute: mean2(&rows, |r| r.damage_per_minute)?,
            vision_score_per_minute: mean2(&rows, |r| r.vision_score_per_minute)?,
            lane_minions_before_10_minutes: mean2(&rows, |r| r.lane_minions_before_10_minutes)?,
            jungle_cs_before_10_minutes: mean2(&rows, |r| r.jungle_cs_before_10_minutes)?,
            solo_kills: mean2(&rows, |r| r.solo_kills)?,
        })
    })
}

/// Winrate by primary and secondary rune tree.
pub fn rune_trees(rows: &[CanonicalRow]) -> Vec<RuneTreeRow> {
    let groups = group_by(rows, |r| {
        Some((
            r.champion.clone()?,
            r.role.clone()?,
            tree_name(r.primary_tree?),
            tree_name(r.secondary_tree?),
        ))
    });

    purge(
        "rune trees",
        groups,
        |(champion, role, primary_tree, secondary_tree), rows| {
            let outcomes = Outcomes::of(&rows);
            Some(RuneTreeRow {
                champion: non_empty(champion)?,
                role: non_empty(role)?,
                primary_tree,
                secondary_tree,
                winrate: round_to(outcomes.winrate()?, VIEW_PRECISION),
                games_played: outcomes.games,
            })
        },
    )
}

/// Winrate by keystone and secondary tree, best winrate first.
///
/// `score` is `winrate * games_played`, taken before rounding.
pub fn rune_keystones(rows: &[CanonicalRow], refs: &ReferenceMaps) -> Vec<KeystoneRow> {
    let groups = group_by(rows, |r| {
        Some((
            r.champion.clone()?,
            r.role.clone()?,
            refs.rune_name(r.primary_keystone?),
            tree_name(r.secondary_tree?),
        ))
    });

    let mut view = purge(
        "rune keystones",
        groups,
        |(champion, role, primary_keystone, secondary_tree), rows| {
            let outcomes = Outcomes::of(&rows);
            let winrate = outcomes.winrate()?;
            Some(KeystoneRow {
                champion: non_empty(champion)?,
                role: non_empty(role)?,
                primary_keystone: non_empty(primary_keystone)?,
                secondary_tree,
                winrate: round_to(winrate, FINE_PRECISION),
                games_played: outcomes.games,
                score: round_to(winrate * f64::from(outcomes.games), FINE_PRECISION),
            })
        },
    );

    view.sort_by(|a, b| b.winrate.total_cmp(&a.winrate));
    view
}

/// Winrate of games in which each finished item was held, most played first.
///
/// The seven item slots are flattened into one (champion, item, win) entry
/// per occupied slot. Empty slots (id 0) and items outside the reference
/// allow-list are dropped.
pub fn item_winrates(rows: &[CanonicalRow], refs: &ReferenceMaps) -> Vec<ItemWinrateRow> {
    let mut groups: BTreeMap<(String, i64), Outcomes> = BTreeMap::new();

    for row in rows {
        let Some(champion) = row.champion.as_ref() else {
            continue;
        };
        for item in row.items.iter().flatten().filter(|&&id| id != 0) {
            groups
                .entry((champion.clone(), *item))
                .or_default()
                .record(row.win);
        }
    }

    let total = groups.len();
    let mut view: Vec<ItemWinrateRow> = groups
        .into_iter()
        .filter_map(|((champion, item), outcomes)| {
            let name = refs.item_name(item)?;
            Some(ItemWinrateRow {
                champion: non_empty(champion)?,
                item: non_empty(name.to_string())?,
                winrate: round_to(outcomes.winrate()?, FINE_PRECISION),
                games_played: outcomes.games,
            })
        })
        .collect();
    debug!(
        "item winrates: kept {} of {} (champion, item) groups",
        view.len(),
        total
    );

    view.sort_by(|a, b| b.games_played.cmp(&a.games_played));
    view
}

/// Group rows by `key` in ascending key order, skipping rows without a key.
fn group_by<'a, K: Ord>(
    rows: &'a [CanonicalRow],
    key: impl Fn(&CanonicalRow) -> Option<K>,
) -> BTreeMap<K, Vec<&'a CanonicalRow>> {
    let mut groups: BTreeMap<K, Vec<&CanonicalRow>> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(row);
        }
    }
    groups
}

/// Build one output row per group, dropping groups that come back `None`.
fn purge<K, T>(
    view: &str,
    groups: BTreeMap<K, Vec<&CanonicalRow>>,
    build: impl Fn(K, Vec<&CanonicalRow>) -> Option<T>,
) -> Vec<T> {
    let total = groups.len();
    let out: Vec<T> = groups
        .into_iter()
        .filter_map(|(key, rows)| build(key, rows))
        .collect();
    if out.len() < total {
        debug!("{}: purged {} incomplete rows", view, total - out.len());
    }
    out
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn int(value: Option<i64>) -> Option<f64> {
    value.map(|v| v as f64)
}

/// Mean of the present values, rounded to two places.
fn mean2(rows: &[&CanonicalRow], metric: impl Fn(&CanonicalRow) -> Option<f64>) -> Option<f64> {
    let (sum, count) = rows
        .iter()
        .filter_map(|r| metric(r))
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(round_to(sum / f64::from(count), VIEW_PRECISION))
    }
}

/// Win/loss tally over rows with a known outcome.
#[derive(Debug, Default, Clone, Copy)]
struct Outcomes {
    wins: u32,
    games: u32,
}

impl Outcomes {
    fn of(rows: &[&CanonicalRow]) -> Self {
        let mut outcomes = Self::default();
        for row in rows {
            outcomes.record(row.win);
        }
        outcomes
    }

    fn record(&mut self, win: Option<bool>) {
        if let Some(win) = win {
            self.games += 1;
            if win {
                self.wins += 1;
            }
        }
    }

    fn winrate(&self) -> Option<f64> {
        if self.games == 0 {
            None
        } else {
            Some(f64::from(self.wins) / f64::from(self.games))
        }
    }
}
