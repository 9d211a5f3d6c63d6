//! Application state for downstream consumers.
//!
//! Holds the stats table, the reference maps and the six views computed from
//! them. Views are recomputed whenever the table is replaced, never patched.

use tracing::info;

use crate::calculate::{aggregate, best_runepages};
use crate::models::{ChampionData, DerivedViews, RunepageRecommendations, StatTable};
use crate::reference::ReferenceMaps;

/// Consumables, wards, starters and jungle companions. Never shown in the
/// per-champion item table.
pub const IRRELEVANT_ITEMS: &[&str] = &[
    "Stealth Ward",
    "Oracle Lens",
    "Control Ward",
    "Health Potion",
    "Elixir of Avarice",
    "Elixir of Force",
    "Farsight Alteration",
    "Elixir of Iron",
    "Elixir of Sorcery",
    "Elixir of Wrath",
    "Elixir of Skill",
    "Doran's Blade",
    "Doran's Ring",
    "Doran's Shield",
    "Cull",
    "Mosstomper Seedling",
    "Scorchclaw Pup",
    "Gustwalker Hatchling",
];

/// Display names whose API champion name differs.
const CHAMPION_NAME_OVERRIDES: &[(&str, &str)] = &[
    ("Lee Sin", "LeeSin"),
    ("Jarvan IV", "JarvanIV"),
    ("Aurelion Sol", "AurelionSol"),
    ("Miss Fortune", "MissFortune"),
    ("Master Yi", "MasterYi"),
    ("Tahm Kench", "TahmKench"),
    ("Xin Zhao", "XinZhao"),
    ("Twisted Fate", "TwistedFate"),
    ("Dr Mundo", "DrMundo"),
];

/// Champion name as the match API reports it, given a display name.
pub fn api_champion_name(display: &str) -> &str {
    CHAMPION_NAME_OVERRIDES
        .iter()
        .find(|(name, _)| *name == display)
        .map_or(display, |(_, api)| *api)
}

/// Dashboard state built from one snapshot of the stats table.
#[derive(Debug, Clone)]
pub struct DashboardState {
    table: StatTable,
    references: ReferenceMaps,
    views: DerivedViews,
}

impl DashboardState {
    pub fn new(table: StatTable, references: ReferenceMaps) -> Self {
        let views = aggregate(&table, &references);
        info!(
            "Dashboard built from {} rows ({} champion/role pairs)",
            table.len(),
            views.winrate_by_role.len()
        );
        Self {
            table,
            references,
            views,
        }
    }

    /// Replace the table and recompute every view.
    pub fn refresh(&mut self, table: StatTable) {
        self.views = aggregate(&table, &self.references);
        self.table = table;
    }

    pub fn table(&self) -> &StatTable {
        &self.table
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    /// The six views narrowed to one champion and role.
    ///
    /// The item view has no role and is filtered by champion only, with
    /// [`IRRELEVANT_ITEMS`] removed. `champion` may be a display name.
    pub fn champion_data(&self, champion: &str, role: &str) -> ChampionData {
        let champion = api_champion_name(champion);
        let views = &self.views;
        let matches = |c: &str, r: &str| c == champion && r == role;

        ChampionData {
            champion: champion.to_string(),
            role: role.to_string(),
            objective_control: views
                .objective_control
                .iter()
                .filter(|r| matches(&r.champion, &r.role))
                .cloned()
                .collect(),
            winrate_by_role: views
                .winrate_by_role
                .iter()
                .filter(|r| matches(&r.champion, &r.role))
                .cloned()
                .collect(),
            effectiveness: views
                .effectiveness
                .iter()
                .filter(|r| matches(&r.champion, &r.role))
                .cloned()
                .collect(),
            rune_trees: views
                .rune_trees
                .iter()
                .filter(|r| matches(&r.champion, &r.role))
                .cloned()
                .collect(),
            rune_keystones: views
                .rune_keystones
                .iter()
                .filter(|r| matches(&r.champion, &r.role))
                .cloned()
                .collect(),
            item_winrates: views
                .item_winrates
                .iter()
                .filter(|r| r.champion == champion && !IRRELEVANT_ITEMS.contains(&r.item.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Best rune pages for one champion and role, if any keystone data exists.
    pub fn runepage_recommendations(
        &self,
        champion: &str,
        role: &str,
    ) -> Option<RunepageRecommendations> {
        best_runepages(&self.champion_data(champion, role).rune_keystones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalRow, MatchId};
    use std::collections::HashMap;

    fn game(id: &str, champion: &str, role: &str, win: bool, items: [i64; 2]) -> CanonicalRow {
        CanonicalRow {
            champion: Some(champion.to_string()),
            role: Some(role.to_string()),
            win: Some(win),
            primary_tree: Some(8100),
            primary_keystone: Some(8112),
            secondary_tree: Some(8200),
            items: [Some(items[0]), Some(items[1]), None, None, None, None, None],
            ..CanonicalRow::new(MatchId::from(id))
        }
    }

    fn references() -> ReferenceMaps {
        ReferenceMaps::new(
            HashMap::from([(8112, "Electrocute".to_string())]),
            HashMap::from([
                (3089, "Rabadon's Deathcap".to_string()),
                (3340, "Stealth Ward".to_string()),
                (1056, "Doran's Ring".to_string()),
            ]),
        )
    }

    fn table() -> StatTable {
        StatTable::from_rows(vec![
            game("m1", "Ahri", "MIDDLE", true, [3089, 3340]),
            game("m2", "Ahri", "TOP", false, [3089, 1056]),
            game("m3", "LeeSin", "JUNGLE", true, [3089, 3340]),
        ])
    }

    #[test]
    fn test_api_champion_name() {
        assert_eq!(api_champion_name("Lee Sin"), "LeeSin");
        assert_eq!(api_champion_name("Ahri"), "Ahri");
    }

    #[test]
    fn test_champion_data_filters_by_champion_and_role() {
        let state = DashboardState::new(table(), references());

        let data = state.champion_data("Ahri", "MIDDLE");
        assert_eq!(data.winrate_by_role.len(), 1);
        assert_eq!(data.winrate_by_role[0].games_played, 1);
        assert_eq!(data.rune_keystones.len(), 1);
        assert_eq!(data.rune_keystones[0].primary_keystone, "Electrocute");
    }

    #[test]
    fn test_item_table_ignores_role_and_deny_list() {
        let state = DashboardState::new(table(), references());

        let data = state.champion_data("Ahri", "MIDDLE");
        let items: Vec<&str> = data.item_winrates.iter().map(|r| r.item.as_str()).collect();
        // TOP games contribute too; wards and starters are removed.
        assert_eq!(items, vec!["Rabadon's Deathcap"]);
        assert_eq!(data.item_winrates[0].games_played, 2);
        assert_eq!(data.item_winrates[0].winrate, 0.5);
    }

    #[test]
    fn test_champion_data_accepts_display_name() {
        let state = DashboardState::new(table(), references());

        let data = state.champion_data("Lee Sin", "JUNGLE");
        assert_eq!(data.champion, "LeeSin");
        assert!(!data.is_empty());
    }

    #[test]
    fn test_unknown_champion_is_empty() {
        let state = DashboardState::new(table(), references());

        assert!(state.champion_data("Teemo", "TOP").is_empty());
        assert_eq!(state.runepage_recommendations("Teemo", "TOP"), None);
    }

    #[test]
    fn test_refresh_recomputes_views() {
        let mut state = DashboardState::new(StatTable::new(), references());
        assert!(state.views().winrate_by_role.is_empty());

        state.refresh(table());
        assert_eq!(state.table().len(), 3);
        assert_eq!(state.views().winrate_by_role.len(), 3);

        let recs = state.runepage_recommendations("Ahri", "MIDDLE").unwrap();
        assert_eq!(recs.by_winrate.keystone, "Electrocute");
        assert_eq!(recs.by_winrate.secondary_tree, "Sorcery");
    }
}
