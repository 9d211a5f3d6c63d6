//! Rune and item id→name reference maps.
//!
//! Built from the community game-data catalogues (`perks.json`,
//! `items.json`). Both documents are walked as untyped JSON trees: every
//! object that carries an `id` contributes one entry, paired with the `name`
//! on the same object.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::cache::DocumentCache;
use crate::fetch::FetchError;

/// Rune tree ids and their display names.
pub const TREE_NAMES: &[(i64, &str)] = &[
    (8000, "Precision"),
    (8100, "Domination"),
    (8200, "Sorcery"),
    (8300, "Inspiration"),
    (8400, "Resolve"),
];

/// Tier-two boots. They build into tier-three upgrades but are tracked as
/// finished items.
pub const T2_BOOTS: &[i64] = &[3117, 3158, 3047, 3111, 3006, 3005, 3009, 3010, 3020];

/// Errors that can occur while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No id/name entries found in {0}")]
    Empty(Url),
}

/// Display name for a rune tree id, or the id itself when unknown.
pub fn tree_name(id: i64) -> String {
    TREE_NAMES
        .iter()
        .find(|(tree, _)| *tree == id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Every object in `root` that has a `key` entry, depth first in document
/// order.
pub fn collect_objects_with_key<'a>(root: &'a Value, key: &str) -> Vec<&'a Map<String, Value>> {
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                if map.contains_key(key) {
                    found.push(map);
                }
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    found
}

fn id_and_name(object: &Map<String, Value>) -> Option<(i64, &str)> {
    let id = object.get("id")?.as_i64()?;
    let name = object.get("name")?.as_str()?;
    Some((id, name))
}

/// Rune id → rune name, from a `perks.json` document.
pub fn rune_names_from_json(doc: &Value) -> HashMap<i64, String> {
    collect_objects_with_key(doc, "id")
        .into_iter()
        .filter_map(id_and_name)
        .map(|(id, name)| (id, name.to_string()))
        .collect()
}

/// Item id → item name for finished items, from an `items.json` document.
///
/// An item is finished when it builds into nothing (`to` empty or absent) or
/// is a tier-two boot.
pub fn terminal_item_names_from_json(doc: &Value) -> HashMap<i64, String> {
    collect_objects_with_key(doc, "id")
        .into_iter()
        .filter(|object| {
            let builds_into_nothing = object
                .get("to")
                .and_then(Value::as_array)
                .map_or(true, |to| to.is_empty());
            let is_t2_boot = object
                .get("id")
                .and_then(Value::as_i64)
                .is_some_and(|id| T2_BOOTS.contains(&id));
            builds_into_nothing || is_t2_boot
        })
        .filter_map(id_and_name)
        .map(|(id, name)| (id, name.to_string()))
        .collect()
}

/// Id→name lookups consumed by the aggregation engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMaps {
    /// Every rune, keyed by perk id
    pub rune_names: HashMap<i64, String>,

    /// Finished items only; an item missing here is not tracked
    pub item_names: HashMap<i64, String>,
}

impl ReferenceMaps {
    pub fn new(rune_names: HashMap<i64, String>, item_names: HashMap<i64, String>) -> Self {
        Self {
            rune_names,
            item_names,
        }
    }

    pub fn from_documents(perks: &Value, items: &Value) -> Self {
        Self::new(
            rune_names_from_json(perks),
            terminal_item_names_from_json(items),
        )
    }

    /// Rune name, or the id itself when unknown.
    pub fn rune_name(&self, id: i64) -> String {
        self.rune_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Item name, if the item is tracked.
    pub fn item_name(&self, id: i64) -> Option<&str> {
        self.item_names.get(&id).map(String::as_str)
    }
}

/// Where the reference catalogues live.
pub struct ReferenceSource {
    cache: DocumentCache,
    perks_url: Url,
    items_url: Url,
}

impl ReferenceSource {
    pub fn new(cache: DocumentCache, perks_url: &str, items_url: &str) -> Result<Self, ReferenceError> {
        Ok(Self {
            cache,
            perks_url: Url::parse(perks_url)?,
            items_url: Url::parse(items_url)?,
        })
    }

    /// Fetch both catalogues (through the cache) and build the maps.
    ///
    /// A catalogue that cannot be fetched falls back to its cached copy,
    /// however old.
    pub async fn load(&self) -> Result<ReferenceMaps, ReferenceError> {
        let perks = self.document(&self.perks_url).await?;
        let items = self.document(&self.items_url).await?;

        let maps = ReferenceMaps::from_documents(&perks, &items);
        if maps.rune_names.is_empty() {
            return Err(ReferenceError::Empty(self.perks_url.clone()));
        }
        if maps.item_names.is_empty() {
            return Err(ReferenceError::Empty(self.items_url.clone()));
        }

        info!(
            "Loaded {} rune names and {} tracked items",
            maps.rune_names.len(),
            maps.item_names.len()
        );
        Ok(maps)
    }

    async fn document(&self, url: &Url) -> Result<Value, ReferenceError> {
        match self.cache.fetch_json(url).await {
            Ok(value) => Ok(value),
            Err(err) => match self.cache.cached_json(url).await {
                Some(stale) => {
                    warn!("Could not refresh {} ({}); using cached copy", url, err);
                    Ok(stale)
                }
                None => Err(err.into()),
            },
        }
    }

    /// Build the maps from whatever is already cached, without touching the
    /// network. Missing catalogues give empty maps.
    pub async fn load_offline(&self) -> ReferenceMaps {
        let perks = self.cache.cached_json(&self.perks_url).await;
        let items = self.cache.cached_json(&self.items_url).await;
        if perks.is_none() || items.is_none() {
            warn!("Reference catalogues not cached; names will be missing");
        }

        let null = Value::Null;
        let maps = ReferenceMaps::from_documents(
            perks.as_ref().unwrap_or(&null),
            items.as_ref().unwrap_or(&null),
        );
        debug!(
            "Offline reference maps: {} runes, {} items",
            maps.rune_names.len(),
            maps.item_names.len()
        );
        maps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::cache::DocumentCacheConfig;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn items_doc() -> Value {
        json!([
            { "id": 1001, "name": "Boots", "to": [3006, 3020, 3111] },
            { "id": 3020, "name": "Sorcerer's Shoes", "from": [1001], "to": [3175] },
            { "id": 3089, "name": "Rabadon's Deathcap", "to": [] },
            { "id": 1052, "name": "Amplifying Tome", "to": [3089, 3157] },
            { "id": 3340, "name": "Stealth Ward" },
            { "id": 2055, "name": "Control Ward", "to": [] }
        ])
    }

    #[test]
    fn test_tree_name() {
        assert_eq!(tree_name(8100), "Domination");
        assert_eq!(tree_name(8400), "Resolve");
        assert_eq!(tree_name(9999), "9999");
    }

    #[test]
    fn test_collect_objects_with_key_walks_nested_structures() {
        let doc = json!({
            "styles": [
                { "id": 8100, "name": "Domination", "slots": [
                    { "perks": [{ "id": 8112, "name": "Electrocute" }] }
                ]},
                { "name": "no id here" }
            ],
            "id": 1
        });

        let ids: Vec<i64> = collect_objects_with_key(&doc, "id")
            .iter()
            .map(|o| o["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&1));
        assert!(ids.contains(&8100));
        assert!(ids.contains(&8112));
    }

    #[test]
    fn test_rune_names_pair_within_each_object() {
        // An object with an id but no name must not shift the pairing.
        let doc = json!([
            { "id": 8005, "name": "Press the Attack" },
            { "id": 7000 },
            { "name": "Orphan" },
            { "id": 8112, "name": "Electrocute" }
        ]);

        let runes = rune_names_from_json(&doc);
        assert_eq!(runes.len(), 2);
        assert_eq!(runes[&8005], "Press the Attack");
        assert_eq!(runes[&8112], "Electrocute");
    }

    #[test]
    fn test_terminal_items() {
        let items = terminal_item_names_from_json(&items_doc());

        assert!(items.contains_key(&3089));
        assert!(items.contains_key(&3020), "tier-two boots are kept");
        assert!(items.contains_key(&3340), "missing `to` counts as terminal");
        assert!(!items.contains_key(&1001));
        assert!(!items.contains_key(&1052));
    }

    #[test]
    fn test_reference_maps_lookups() {
        let maps = ReferenceMaps::from_documents(
            &json!([{ "id": 8112, "name": "Electrocute" }]),
            &items_doc(),
        );

        assert_eq!(maps.rune_name(8112), "Electrocute");
        assert_eq!(maps.rune_name(8021), "8021");
        assert_eq!(maps.item_name(3089), Some("Rabadon's Deathcap"));
        assert_eq!(maps.item_name(1052), None);
    }

    const PERKS_URL: &str = "http://reference-test.invalid/perks.json";
    const ITEMS_URL: &str = "http://reference-test.invalid/items.json";

    fn unreachable_source(temp_dir: &TempDir) -> ReferenceSource {
        let cache = DocumentCache::new(DocumentCacheConfig {
            cache_dir: temp_dir.path().to_path_buf(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap();
        ReferenceSource::new(cache, PERKS_URL, ITEMS_URL).unwrap()
    }

    #[tokio::test]
    async fn test_load_offline_without_cache_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let source = unreachable_source(&temp_dir);

        assert_eq!(source.load_offline().await, ReferenceMaps::default());
    }

    #[tokio::test]
    async fn test_load_falls_back_to_expired_cache() {
        let temp_dir = TempDir::new().unwrap();
        let source = unreachable_source(&temp_dir);

        let last_week = Utc::now() - chrono::Duration::days(7);
        let perks = json!([{ "id": 8112, "name": "Electrocute" }]);
        source
            .cache
            .store(&source.perks_url, perks.to_string().as_bytes(), last_week)
            .unwrap();
        source
            .cache
            .store(&source.items_url, items_doc().to_string().as_bytes(), last_week)
            .unwrap();

        let maps = source.load().await.unwrap();
        assert_eq!(maps.rune_name(8112), "Electrocute");
        assert_eq!(maps.item_name(3089), Some("Rabadon's Deathcap"));
    }

    #[tokio::test]
    async fn test_load_without_cache_or_network_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = unreachable_source(&temp_dir);

        assert!(matches!(
            source.load().await,
            Err(ReferenceError::Fetch(_))
        ));
    }

    #[test]
    fn test_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DocumentCache::new(DocumentCacheConfig {
            cache_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            ReferenceSource::new(cache, "not a url", "http://x.invalid/items.json"),
            Err(ReferenceError::InvalidUrl(_))
        ));
    }
}
