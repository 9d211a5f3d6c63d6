//! Parquet storage for the canonical statistics table.
//!
//! The whole table is one Snappy-compressed file that is rewritten on every
//! update. Rows are stored newest match first.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info};

use super::{ensure_parent, tmp_path, StorageConfig, StorageError};
use crate::models::{CanonicalRow, MatchId, StatTable};

type Getter<T> = fn(&CanonicalRow) -> Option<T>;
type Setter<T> = fn(&mut CanonicalRow, Option<T>);

/// How one nullable column maps onto a [`CanonicalRow`] field.
#[derive(Clone, Copy)]
enum Accessor {
    Text(fn(&CanonicalRow) -> Option<&str>, Setter<String>),
    Flag(Getter<bool>, Setter<bool>),
    Int(Getter<i64>, Setter<i64>),
    Float(Getter<f64>, Setter<f64>),
}

impl Accessor {
    fn data_type(&self) -> DataType {
        match self {
            Accessor::Text(..) => DataType::Utf8,
            Accessor::Flag(..) => DataType::Boolean,
            Accessor::Int(..) => DataType::Int64,
            Accessor::Float(..) => DataType::Float64,
        }
    }
}

/// Every column after `match_id`, in file order.
fn columns() -> Vec<(&'static str, Accessor)> {
    use Accessor::*;
    vec![
        ("champion", Text(|r| r.champion.as_deref(), |r, v| r.champion = v)),
        ("role", Text(|r| r.role.as_deref(), |r, v| r.role = v)),
        ("patch", Text(|r| r.patch.as_deref(), |r, v| r.patch = v)),
        ("win", Flag(|r| r.win, |r, v| r.win = v)),
        ("summoner1", Int(|r| r.summoner1, |r, v| r.summoner1 = v)),
        ("summoner2", Int(|r| r.summoner2, |r, v| r.summoner2 = v)),
        ("turrets_killed", Int(|r| r.turrets_killed, |r, v| r.turrets_killed = v)),
        (
            "total_minions_killed",
            Int(|r| r.total_minions_killed, |r, v| r.total_minions_killed = v),
        ),
        (
            "total_jungle_monsters_killed",
            Int(
                |r| r.total_jungle_monsters_killed,
                |r, v| r.total_jungle_monsters_killed = v,
            ),
        ),
        (
            "total_damage_dealt_to_champions",
            Int(
                |r| r.total_damage_dealt_to_champions,
                |r, v| r.total_damage_dealt_to_champions = v,
            ),
        ),
        ("item0", Int(|r| r.items[0], |r, v| r.items[0] = v)),
        ("item1", Int(|r| r.items[1], |r, v| r.items[1] = v)),
        ("item2", Int(|r| r.items[2], |r, v| r.items[2] = v)),
        ("item3", Int(|r| r.items[3], |r, v| r.items[3] = v)),
        ("item4", Int(|r| r.items[4], |r, v| r.items[4] = v)),
        ("item5", Int(|r| r.items[5], |r, v| r.items[5] = v)),
        ("item6", Int(|r| r.items[6], |r, v| r.items[6] = v)),
        ("kda", Float(|r| r.kda, |r, v| r.kda = v)),
        (
            "kill_participation",
            Float(|r| r.kill_participation, |r, v| r.kill_participation = v),
        ),
        ("damage_share", Float(|r| r.damage_share, |r, v| r.damage_share = v)),
        (
            "turret_plates_taken",
            Float(|r| r.turret_plates_taken, |r, v| r.turret_plates_taken = v),
        ),
        ("gold_per_minute", Float(|r| r.gold_per_minute, |r, v| r.gold_per_minute = v)),
        (
            "damage_per_minute",
            Float(|r| r.damage_per_minute, |r, v| r.damage_per_minute = v),
        ),
        (
            "vision_score_per_minute",
            Float(
                |r| r.vision_score_per_minute,
                |r, v| r.vision_score_per_minute = v,
            ),
        ),
        (
            "lane_minions_before_10_minutes",
            Float(
                |r| r.lane_minions_before_10_minutes,
                |r, v| r.lane_minions_before_10_minutes = v,
            ),
        ),
        (
            "jungle_cs_before_10_minutes",
            Float(
                |r| r.jungle_cs_before_10_minutes,
                |r, v| r.jungle_cs_before_10_minutes = v,
            ),
        ),
        ("solo_kills", Float(|r| r.solo_kills, |r, v| r.solo_kills = v)),
        ("barons_killed", Int(|r| r.barons_killed, |r, v| r.barons_killed = v)),
        ("dragons_killed", Int(|r| r.dragons_killed, |r, v| r.dragons_killed = v)),
        ("void_grubs_killed", Int(|r| r.void_grubs_killed, |r, v| r.void_grubs_killed = v)),
        (
            "rift_heralds_killed",
            Int(|r| r.rift_heralds_killed, |r, v| r.rift_heralds_killed = v),
        ),
        ("defense_rune", Int(|r| r.defense_rune, |r, v| r.defense_rune = v)),
        ("flex_rune", Int(|r| r.flex_rune, |r, v| r.flex_rune = v)),
        ("offense_rune", Int(|r| r.offense_rune, |r, v| r.offense_rune = v)),
        ("primary_tree", Int(|r| r.primary_tree, |r, v| r.primary_tree = v)),
        ("primary_keystone", Int(|r| r.primary_keystone, |r, v| r.primary_keystone = v)),
        ("primary_choice1", Int(|r| r.primary_choice1, |r, v| r.primary_choice1 = v)),
        ("primary_choice2", Int(|r| r.primary_choice2, |r, v| r.primary_choice2 = v)),
        ("primary_choice3", Int(|r| r.primary_choice3, |r, v| r.primary_choice3 = v)),
        ("secondary_tree", Int(|r| r.secondary_tree, |r, v| r.secondary_tree = v)),
        (
            "secondary_choice1",
            Int(|r| r.secondary_choice1, |r, v| r.secondary_choice1 = v),
        ),
        (
            "secondary_choice2",
            Int(|r| r.secondary_choice2, |r, v| r.secondary_choice2 = v),
        ),
    ]
}

/// Schema for the stats table.
pub fn stats_schema() -> Schema {
    let mut fields = vec![Field::new("match_id", DataType::Utf8, false)];
    fields.extend(
        columns()
            .into_iter()
            .map(|(name, accessor)| Field::new(name, accessor.data_type(), true)),
    );
    Schema::new(fields)
}

/// Reads and writes `stats.parquet`.
pub struct StatDataStore {
    path: PathBuf,
}

impl StatDataStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.stats_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the full table. A missing file is an empty table.
    pub fn load(&self) -> Result<StatTable, StorageError> {
        if !self.exists() {
            debug!("No stats table at {:?}, starting empty", self.path);
            return Ok(StatTable::new());
        }

        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut rows = Vec::new();
        for batch in reader {
            rows.extend(self.rows_from_batch(&batch?)?);
        }

        debug!("Read {} rows from {:?}", rows.len(), self.path);
        Ok(StatTable::from_rows(rows))
    }

    /// Replace the stored table with `table`.
    ///
    /// The file is written beside the target and renamed into place, so an
    /// interrupted save leaves the previous table intact.
    pub fn save(&self, table: &StatTable) -> Result<(), StorageError> {
        ensure_parent(&self.path)?;

        let schema = Arc::new(stats_schema());
        let batch = to_record_batch(&schema, table.rows())?;

        let tmp = tmp_path(&self.path);
        write_batch(&tmp, &schema, &batch)?;
        fs::rename(&tmp, &self.path)?;

        info!("Wrote {} rows to {:?}", table.len(), self.path);
        Ok(())
    }

    /// Remove the stored table. Missing is fine.
    pub fn clear(&self) -> Result<(), StorageError> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            info!("Removed {:?}", self.path);
        }
        Ok(())
    }

    /// Load, prepend `newest_first`, and save.
    pub fn append(&self, newest_first: Vec<CanonicalRow>) -> Result<StatTable, StorageError> {
        let mut table = self.load()?;
        table.append(newest_first);
        self.save(&table)?;
        Ok(table)
    }

    fn rows_from_batch(&self, batch: &RecordBatch) -> Result<Vec<CanonicalRow>, StorageError> {
        let ids: &StringArray = self.column(batch, "match_id")?;
        let mut rows: Vec<CanonicalRow> = (0..batch.num_rows())
            .map(|i| CanonicalRow::new(MatchId::new(ids.value(i))))
            .collect();

        for (name, accessor) in columns() {
            match accessor {
                Accessor::Text(_, set) => {
                    let col: &StringArray = self.column(batch, name)?;
                    for (i, row) in rows.iter_mut().enumerate() {
                        set(row, nullable(col, i, |c, i| c.value(i).to_string()));
                    }
                }
                Accessor::Flag(_, set) => {
                    let col: &BooleanArray = self.column(batch, name)?;
                    for (i, row) in rows.iter_mut().enumerate() {
                        set(row, nullable(col, i, BooleanArray::value));
                    }
                }
                Accessor::Int(_, set) => {
                    let col: &Int64Array = self.column(batch, name)?;
                    for (i, row) in rows.iter_mut().enumerate() {
                        set(row, nullable(col, i, Int64Array::value));
                    }
                }
                Accessor::Float(_, set) => {
                    let col: &Float64Array = self.column(batch, name)?;
                    for (i, row) in rows.iter_mut().enumerate() {
                        set(row, nullable(col, i, Float64Array::value));
                    }
                }
            }
        }

        Ok(rows)
    }

    fn column<'a, T: Array + 'static>(
        &self,
        batch: &'a RecordBatch,
        name: &str,
    ) -> Result<&'a T, StorageError> {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<T>())
            .ok_or_else(|| StorageError::Schema {
                path: self.path.clone(),
                reason: format!("column `{}` is missing or has the wrong type", name),
            })
    }
}

fn nullable<A: Array, T>(array: &A, i: usize, value: impl Fn(&A, usize) -> T) -> Option<T> {
    if array.is_null(i) {
        None
    } else {
        Some(value(array, i))
    }
}

fn to_record_batch(
    schema: &Arc<Schema>,
    rows: &[CanonicalRow],
) -> Result<RecordBatch, StorageError> {
    let ids: Vec<&str> = rows.iter().map(|r| r.match_id.as_str()).collect();
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(ids))];

    for (_, accessor) in columns() {
        let array: ArrayRef = match accessor {
            Accessor::Text(get, _) => {
                Arc::new(StringArray::from(rows.iter().map(get).collect::<Vec<_>>()))
            }
            Accessor::Flag(get, _) => {
                Arc::new(BooleanArray::from(rows.iter().map(get).collect::<Vec<_>>()))
            }
            Accessor::Int(get, _) => {
                Arc::new(Int64Array::from(rows.iter().map(get).collect::<Vec<_>>()))
            }
            Accessor::Float(get, _) => {
                Arc::new(Float64Array::from(rows.iter().map(get).collect::<Vec<_>>()))
            }
        };
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema.clone(), arrays)?)
}

/// Write a record batch to a Parquet file.
fn write_batch(path: &Path, schema: &Arc<Schema>, batch: &RecordBatch) -> Result<(), StorageError> {
    let file = File::create(path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> StatDataStore {
        StatDataStore::new(&StorageConfig::new(temp_dir.path().to_path_buf()))
    }

    fn full_row(id: &str) -> CanonicalRow {
        CanonicalRow {
            match_id: MatchId::from(id),
            champion: Some("Ahri".to_string()),
            role: Some("MIDDLE".to_string()),
            patch: Some("14.14".to_string()),
            win: Some(true),
            summoner1: Some(4),
            summoner2: Some(14),
            turrets_killed: Some(2),
            total_minions_killed: Some(210),
            total_jungle_monsters_killed: Some(12),
            total_damage_dealt_to_champions: Some(25_000),
            items: [
                Some(3089),
                Some(3157),
                Some(0),
                None,
                Some(3020),
                Some(0),
                Some(3340),
            ],
            kda: Some(4.5),
            kill_participation: Some(0.61),
            damage_share: Some(0.28),
            turret_plates_taken: Some(3.0),
            gold_per_minute: Some(420.5),
            damage_per_minute: Some(850.25),
            vision_score_per_minute: Some(0.9),
            lane_minions_before_10_minutes: Some(78.0),
            jungle_cs_before_10_minutes: Some(0.0),
            solo_kills: Some(1.0),
            barons_killed: Some(1),
            dragons_killed: Some(3),
            void_grubs_killed: Some(6),
            rift_heralds_killed: Some(0),
            defense_rune: Some(5011),
            flex_rune: Some(5008),
            offense_rune: Some(5005),
            primary_tree: Some(8100),
            primary_keystone: Some(8112),
            primary_choice1: Some(8139),
            primary_choice2: Some(8138),
            primary_choice3: Some(8135),
            secondary_tree: Some(8300),
            secondary_choice1: Some(8345),
            secondary_choice2: Some(8347),
        }
    }

    #[test]
    fn test_stats_schema() {
        let schema = stats_schema();
        assert_eq!(schema.fields().len(), 43);
        assert!(!schema.field_with_name("match_id").unwrap().is_nullable());
        assert_eq!(
            schema.field_with_name("win").unwrap().data_type(),
            &DataType::Boolean
        );
        assert_eq!(
            schema.field_with_name("kda").unwrap().data_type(),
            &DataType::Float64
        );
        assert!(schema.field_with_name("item6").is_ok());
    }

    #[test]
    fn test_write_and_read_preserves_values_and_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let sparse = CanonicalRow {
            win: Some(false),
            role: Some(String::new()),
            ..CanonicalRow::new(MatchId::from("NA1_1"))
        };
        let table = StatTable::from_rows(vec![full_row("NA1_2"), sparse]);

        store.save(&table).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_read_nonexistent_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_empty_table_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.save(&StatTable::new()).unwrap();
        assert!(store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.clear().unwrap();
        store.save(&StatTable::new()).unwrap();
        store.clear().unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_append_prepends_newer_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store
            .save(&StatTable::from_rows(vec![full_row("NA1_1")]))
            .unwrap();
        store
            .append(vec![full_row("NA1_3"), full_row("NA1_2")])
            .unwrap();

        let ids: Vec<String> = store
            .load()
            .unwrap()
            .rows()
            .iter()
            .map(|r| r.match_id.to_string())
            .collect();
        assert_eq!(ids, vec!["NA1_3", "NA1_2", "NA1_1"]);
        assert!(!tmp_path(store.path()).exists());
    }
}
