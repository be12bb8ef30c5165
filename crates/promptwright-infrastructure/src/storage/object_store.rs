//! A single keyed collection of JSON records with secondary indexes.

use super::schema::{KEY_PATH, StoreName};
use promptwright_core::error::{Result, StoreError};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

type IndexEntries = BTreeMap<String, BTreeSet<String>>;

/// Records of one store plus the indexes derived from them.
///
/// Indexes are never persisted; they are rebuilt from the records.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    name: StoreName,
    records: BTreeMap<String, Value>,
    indexes: BTreeMap<&'static str, IndexEntries>,
}

impl ObjectStore {
    pub fn new(name: StoreName) -> Self {
        let indexes = name
            .indexes()
            .iter()
            .map(|field| (*field, IndexEntries::new()))
            .collect();
        Self {
            name,
            records: BTreeMap::new(),
            indexes,
        }
    }

    /// Rebuilds a store from persisted records.
    ///
    /// Records without a string key are dropped with a warning rather than
    /// failing the whole load.
    pub fn from_records(name: StoreName, records: Vec<Value>) -> Self {
        let mut store = Self::new(name);
        for record in records {
            if let Err(e) = store.put(record) {
                tracing::warn!(store = %name, "Discarding unreadable record: {}", e);
            }
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }

    /// All records in key order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.records.values()
    }

    /// Primary keys of records whose indexed field equals `value`.
    pub fn keys_by_index(&self, index: &str, value: &str) -> Result<Vec<String>> {
        let entries = self.index(index)?;
        Ok(entries
            .get(value)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Records whose indexed field equals `value`, in key order.
    pub fn values_by_index(&self, index: &str, value: &str) -> Result<Vec<&Value>> {
        let entries = self.index(index)?;
        Ok(entries
            .get(value)
            .map(|keys| keys.iter().filter_map(|k| self.records.get(k)).collect())
            .unwrap_or_default())
    }

    /// Inserts or replaces a record, keyed by its `id` field.
    pub fn put(&mut self, record: Value) -> Result<String> {
        let key = record
            .get(KEY_PATH)
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::engine(format!(
                    "record for store '{}' has no string '{}' key",
                    self.name, KEY_PATH
                ))
            })?;

        if let Some(previous) = self.records.remove(&key) {
            self.unindex(&key, &previous);
        }
        self.index_record(&key, &record);
        self.records.insert(key.clone(), record);
        Ok(key)
    }

    /// Removes a record. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.records.remove(key) {
            Some(previous) => {
                self.unindex(key, &previous);
                true
            }
            None => false,
        }
    }

    fn index(&self, index: &str) -> Result<&IndexEntries> {
        self.indexes.get(index).ok_or_else(|| {
            StoreError::engine(format!("store '{}' has no index '{}'", self.name, index))
        })
    }

    fn index_record(&mut self, key: &str, record: &Value) {
        for (field, entries) in self.indexes.iter_mut() {
            if let Some(value) = record.get(*field).and_then(Value::as_str) {
                entries
                    .entry(value.to_string())
                    .or_default()
                    .insert(key.to_string());
            }
        }
    }

    fn unindex(&mut self, key: &str, record: &Value) {
        for (field, entries) in self.indexes.iter_mut() {
            if let Some(value) = record.get(*field).and_then(Value::as_str) {
                if let Some(keys) = entries.get_mut(value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        entries.remove(value);
                    }
                }
            }
        }
    }
}
