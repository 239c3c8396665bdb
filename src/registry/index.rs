//! Bidirectional asset index.
//!
//! [`AssetIndex`] holds the key to record table and the file name to key
//! table as one value. Every mutation goes through a method that updates both
//! directions, so the pairing cannot drift.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use localfiles_common::{AssetKey, AssetRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub key: AssetKey,
    pub directory: PathBuf,
    pub file_name: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl AssetRecord {
    /// Full path of the file on disk.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Short listing row for the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub key: AssetKey,
    pub file_name: String,
    pub category: Option<String>,
}

impl From<&AssetRecord> for AssetSummary {
    fn from(record: &AssetRecord) -> Self {
        Self {
            key: record.key,
            file_name: record.file_name.clone(),
            category: record.category.clone(),
        }
    }
}

/// Key to record table plus file name to key table, always in step.
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    records: IndexMap<AssetKey, AssetRecord>,
    by_name: BTreeMap<String, AssetKey>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from the two persisted tables.
    ///
    /// When the tables disagree the record table wins: the name table is
    /// rebuilt from it, and records sharing a file name keep only the first
    /// occurrence. The second value is `true` when anything had to be fixed.
    pub fn from_tables(
        records: IndexMap<AssetKey, AssetRecord>,
        names: BTreeMap<String, AssetKey>,
    ) -> (Self, bool) {
        let mut index = Self::new();
        let mut repaired = false;

        for (key, mut record) in records {
            if record.key != key {
                record.key = key;
                repaired = true;
            }
            if index.by_name.contains_key(&record.file_name) {
                repaired = true;
                continue;
            }
            index.by_name.insert(record.file_name.clone(), key);
            index.records.insert(key, record);
        }

        if index.by_name != names {
            repaired = true;
        }

        (index, repaired)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_key(&self, key: AssetKey) -> bool {
        self.records.contains_key(&key)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, key: AssetKey) -> Option<&AssetRecord> {
        self.records.get(&key)
    }

    pub fn key_of(&self, name: &str) -> Option<AssetKey> {
        self.by_name.get(name).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&AssetRecord> {
        self.key_of(name).and_then(|key| self.get(key))
    }

    /// Resolve a key-or-name reference to a live key.
    ///
    /// A numeric reference that is not a live key is retried as a file name.
    pub fn resolve(&self, asset: &AssetRef) -> Option<AssetKey> {
        match asset {
            AssetRef::Key(key) if self.contains_key(*key) => Some(*key),
            AssetRef::Key(key) => self.key_of(&key.to_string()),
            AssetRef::Name(name) => self.key_of(name),
        }
    }

    /// Insert a record, evicting whatever currently holds its file name or key.
    ///
    /// Returns the evicted record with the same file name, if any.
    pub fn insert(&mut self, record: AssetRecord) -> Option<AssetRecord> {
        let replaced = self
            .key_of(&record.file_name)
            .and_then(|old| self.remove(old));
        if self.contains_key(record.key) {
            self.remove(record.key);
        }

        self.by_name.insert(record.file_name.clone(), record.key);
        self.records.insert(record.key, record);
        replaced
    }

    /// Remove a record from both tables.
    pub fn remove(&mut self, key: AssetKey) -> Option<AssetRecord> {
        let record = self.records.shift_remove(&key)?;
        self.by_name.remove(&record.file_name);
        Some(record)
    }

    /// Point `key` at a new file name in both tables.
    ///
    /// Returns `false` when the key is unknown or the name belongs to another
    /// record; nothing changes in that case.
    pub fn rename(&mut self, key: AssetKey, new_name: &str) -> bool {
        match self.key_of(new_name) {
            Some(owner) if owner != key => return false,
            _ => {}
        }
        let Some(record) = self.records.get_mut(&key) else {
            return false;
        };

        self.by_name.remove(&record.file_name);
        record.file_name = new_name.to_string();
        self.by_name.insert(new_name.to_string(), key);
        true
    }

    pub fn set_category(&mut self, key: AssetKey, category: Option<String>) -> bool {
        match self.records.get_mut(&key) {
            Some(record) => {
                record.category = category;
                true
            }
            None => false,
        }
    }

    pub fn set_description(&mut self, key: AssetKey, description: Option<String>) -> bool {
        match self.records.get_mut(&key) {
            Some(record) => {
                record.description = description;
                true
            }
            None => false,
        }
    }

    pub fn set_source_url(&mut self, key: AssetKey, url: Option<String>) -> bool {
        match self.records.get_mut(&key) {
            Some(record) => {
                record.source_url = url;
                true
            }
            None => false,
        }
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Records tagged with exactly `category`, in insertion order.
    pub fn in_category<'a, 'b>(
        &'a self,
        category: &'b str,
    ) -> impl Iterator<Item = &'a AssetRecord> + use<'a, 'b> {
        self.records
            .values()
            .filter(move |r| r.category.as_deref() == Some(category))
    }

    /// The key to record table as persisted.
    pub fn records_table(&self) -> &IndexMap<AssetKey, AssetRecord> {
        &self.records
    }

    /// The file name to key table as persisted.
    pub fn names_table(&self) -> &BTreeMap<String, AssetKey> {
        &self.by_name
    }

    /// Check that both directions describe the same set of records.
    pub fn is_consistent(&self) -> bool {
        self.records.len() == self.by_name.len()
            && self.records.iter().all(|(key, record)| {
                record.key == *key && self.by_name.get(&record.file_name) == Some(key)
            })
            && self
                .by_name
                .iter()
                .all(|(name, key)| self.records.get(key).is_some_and(|r| &r.file_name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: u32, name: &str) -> AssetRecord {
        AssetRecord {
            key: AssetKey::new(key).unwrap(),
            directory: PathBuf::from("/content"),
            file_name: name.to_string(),
            source_url: None,
            description: None,
            category: None,
            size_bytes: 10,
            created_at: Utc::now(),
            mime_type: "image/png".to_string(),
            width: 1,
            height: 1,
        }
    }

    fn key(raw: u32) -> AssetKey {
        AssetKey::new(raw).unwrap()
    }

    #[test]
    fn insert_replaces_same_name() {
        let mut index = AssetIndex::new();
        assert!(index.insert(record(1, "a.png")).is_none());
        let replaced = index.insert(record(2, "a.png")).unwrap();

        assert_eq!(replaced.key, key(1));
        assert_eq!(index.len(), 1);
        assert_eq!(index.key_of("a.png"), Some(key(2)));
        assert!(!index.contains_key(key(1)));
        assert!(index.is_consistent());
    }

    #[test]
    fn remove_clears_both_directions() {
        let mut index = AssetIndex::new();
        index.insert(record(1, "a.png"));
        index.insert(record(2, "b.png"));

        let removed = index.remove(key(1)).unwrap();
        assert_eq!(removed.file_name, "a.png");
        assert!(index.key_of("a.png").is_none());
        assert!(index.get(key(1)).is_none());
        assert!(index.is_consistent());
    }

    #[test]
    fn rename_retargets_name_table() {
        let mut index = AssetIndex::new();
        index.insert(record(1, "a.png"));

        assert!(index.rename(key(1), "b.png"));
        assert!(index.key_of("a.png").is_none());
        assert_eq!(index.key_of("b.png"), Some(key(1)));
        assert_eq!(index.get(key(1)).unwrap().file_name, "b.png");
        assert!(index.is_consistent());
    }

    #[test]
    fn rename_refuses_taken_name() {
        let mut index = AssetIndex::new();
        index.insert(record(1, "a.png"));
        index.insert(record(2, "b.png"));

        assert!(!index.rename(key(1), "b.png"));
        assert!(!index.rename(key(3), "c.png"));
        assert_eq!(index.key_of("a.png"), Some(key(1)));
        assert!(index.is_consistent());
    }

    #[test]
    fn resolve_by_key_and_name() {
        let mut index = AssetIndex::new();
        index.insert(record(7, "a.png"));

        assert_eq!(index.resolve(&AssetRef::Key(key(7))), Some(key(7)));
        assert_eq!(index.resolve(&AssetRef::from("a.png")), Some(key(7)));
        assert_eq!(index.resolve(&AssetRef::Key(key(8))), None);
        assert_eq!(index.resolve(&AssetRef::from("z.png")), None);
    }

    #[test]
    fn numeric_name_resolves_when_not_a_key() {
        let mut index = AssetIndex::new();
        index.insert(record(7, "1234"));

        assert_eq!(index.resolve(&AssetRef::parse("1234")), Some(key(7)));
        assert_eq!(index.resolve(&AssetRef::parse("7")), Some(key(7)));
    }

    #[test]
    fn category_filter_keeps_insertion_order() {
        let mut index = AssetIndex::new();
        for (k, name) in [(30, "c.png"), (10, "a.png"), (20, "b.png")] {
            index.insert(record(k, name));
            index.set_category(key(k), Some("signs".to_string()));
        }
        index.set_category(key(10), Some("other".to_string()));

        let names: Vec<_> = index.in_category("signs").map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["c.png", "b.png"]);
    }

    #[test]
    fn from_tables_repairs_mismatch() {
        let mut records = IndexMap::new();
        records.insert(key(1), record(1, "a.png"));
        records.insert(key(2), record(2, "a.png"));
        records.insert(key(3), record(3, "b.png"));
        let mut names = BTreeMap::new();
        names.insert("stale.png".to_string(), key(9));

        let (index, repaired) = AssetIndex::from_tables(records, names);
        assert!(repaired);
        assert_eq!(index.len(), 2);
        assert_eq!(index.key_of("a.png"), Some(key(1)));
        assert!(index.is_consistent());
    }

    #[test]
    fn from_tables_accepts_consistent_pair() {
        let mut original = AssetIndex::new();
        original.insert(record(1, "a.png"));
        original.insert(record(2, "b.png"));

        let (index, repaired) = AssetIndex::from_tables(
            original.records_table().clone(),
            original.names_table().clone(),
        );
        assert!(!repaired);
        assert_eq!(index.len(), 2);
    }
}
