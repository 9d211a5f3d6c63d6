//! Rune page recommendations from the keystone view.

use crate::models::{KeystoneRow, RunepagePick, RunepageRecommendations};

/// Best keystone row by winrate, by score and by games played.
///
/// Ties go to the row that appears first. Returns `None` when `rows` is empty.
pub fn best_runepages(rows: &[KeystoneRow]) -> Option<RunepageRecommendations> {
    Some(RunepageRecommendations {
        by_winrate: first_max(rows, |r| r.winrate)?.into(),
        by_score: first_max(rows, |r| r.score)?.into(),
        by_games: first_max(rows, |r| f64::from(r.games_played))?.into(),
    })
}

fn first_max(rows: &[KeystoneRow], key: impl Fn(&KeystoneRow) -> f64) -> Option<&KeystoneRow> {
    rows.iter()
        .reduce(|best, row| if key(row) > key(best) { row } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(keystone: &str, winrate: f64, games_played: u32) -> KeystoneRow {
        KeystoneRow {
            champion: "Ahri".into(),
            role: "MIDDLE".into(),
            primary_keystone: keystone.into(),
            secondary_tree: "Sorcery".into(),
            winrate,
            games_played,
            score: winrate * f64::from(games_played),
        }
    }

    #[test]
    fn test_each_criterion_picks_its_own_page() {
        let rows = vec![page("A", 0.6, 10), page("B", 0.55, 50)];

        let recs = best_runepages(&rows).unwrap();
        assert_eq!(recs.by_winrate.keystone, "A");
        assert_eq!(recs.by_score.keystone, "B");
        assert_eq!(recs.by_games.keystone, "B");
        assert_eq!(recs.by_games.games_played, 50);
    }

    #[test]
    fn test_ties_keep_first_row() {
        let rows = vec![page("A", 0.5, 4), page("B", 0.5, 4)];

        let recs = best_runepages(&rows).unwrap();
        assert_eq!(recs.by_winrate.keystone, "A");
        assert_eq!(recs.by_score.keystone, "A");
        assert_eq!(recs.by_games.keystone, "A");
    }

    #[test]
    fn test_empty_has_no_recommendation() {
        assert_eq!(best_runepages(&[]), None);
    }
}
