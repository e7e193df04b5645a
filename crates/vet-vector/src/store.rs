//! Content store.
//!
//! Maps positional vector ids back to knowledge-base records. On disk it is a
//! JSON object keyed by the stringified id (`"0"`, `"1"`, ...), the same ids
//! the index was built with.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};
use vet_types::ContentRecord;

use crate::error::VectorError;

/// Read-only id → record lookup.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    records: BTreeMap<u64, ContentRecord>,
}

impl ContentStore {
    /// Build a store with ids `0..N-1` in input order.
    pub fn from_records(records: Vec<ContentRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| (i as u64, r.normalized()))
            .collect();
        Self { records }
    }

    /// Parse a content file.
    ///
    /// Every key must be a non-negative integer. Records are normalized on load.
    pub fn from_json(raw: &str) -> Result<Self, VectorError> {
        let parsed: BTreeMap<String, ContentRecord> = serde_json::from_str(raw)?;

        let mut records = BTreeMap::new();
        for (key, record) in parsed {
            let id: u64 = key
                .trim()
                .parse()
                .map_err(|_| VectorError::Content(format!("key {:?} is not a record id", key)))?;
            if records.insert(id, record.normalized()).is_some() {
                return Err(VectorError::Content(format!("duplicate record id {}", id)));
            }
        }

        let store = Self { records };
        if let Some(last) = store.records.keys().next_back() {
            if *last as usize + 1 != store.len() {
                warn!(
                    records = store.len(),
                    max_id = last,
                    "Content ids are not contiguous"
                );
            }
        }
        Ok(store)
    }

    /// Load a content file from disk.
    pub fn load(path: &Path) -> Result<Self, VectorError> {
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json(&raw)?;
        info!(path = ?path, records = store.len(), "Loaded content store");
        Ok(store)
    }

    /// Write the store as a JSON object keyed by stringified id.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let keyed: BTreeMap<String, &ContentRecord> = self
            .records
            .iter()
            .map(|(id, record)| (id.to_string(), record))
            .collect();
        std::fs::write(path, serde_json::to_string_pretty(&keyed)?)?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&ContentRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &ContentRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTENT: &str = r#"{
        "0": {"disease": "Foot and Mouth Disease", "animal": "Cattle",
              "symptoms": ["Blisters", "Drooling"], "treatment": "Neem paste"},
        "1": {"title": "Bloat", "animal": "Goat", "symptoms": "Swollen belly"}
    }"#;

    #[test]
    fn test_parse_string_keys() {
        let store = ContentStore::from_json(CONTENT).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().disease, "Foot and Mouth Disease");
        assert_eq!(store.get(1).unwrap().disease, "Bloat");
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_rejects_non_integer_key() {
        let result = ContentStore::from_json(r#"{"first": {"disease": "X"}}"#);
        assert!(matches!(result, Err(VectorError::Content(_))));
    }

    #[test]
    fn test_from_records_assigns_positional_ids() {
        let store = ContentStore::from_records(vec![
            ContentRecord::new(" Mastitis ", "Cow"),
            ContentRecord::new("Ringworm", "Dog"),
        ]);
        assert_eq!(store.get(0).unwrap().disease, "Mastitis");
        assert_eq!(store.get(1).unwrap().disease, "Ringworm");
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("content.json");

        let store = ContentStore::from_json(CONTENT).unwrap();
        store.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"0\""));

        let loaded = ContentStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(0), store.get(0));
    }
}
