//! Record store
//!
//! Wraps the single persisted collection of measurement records. Every
//! mutation is a read-modify-write of the whole collection, which is
//! O(collection size) per call.

use anyhow::{Context, Result};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{MeasurementRecord, RecordId};
use crate::storage::KeyValueStorage;

/// Storage key holding the JSON array of records
pub const STORAGE_KEY: &str = "clientMeasurements";

/// Lookup failures for positional and id-based operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no record at storage index {index} (collection has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no record at display index {index} (collection has {len})")]
    DisplayIndexOutOfRange { index: usize, len: usize },

    #[error("record not found: {0}")]
    NotFound(RecordId),
}

/// Translates a display-order index (0 = most recent) to a storage-order index
pub fn display_to_storage_index(len: usize, display_index: usize) -> Option<usize> {
    if display_index < len {
        Some(len - 1 - display_index)
    } else {
        None
    }
}

/// Persisted ordered collection of records, in append (storage) order
pub struct RecordStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> RecordStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Gets a reference to the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads every record in storage order.
    ///
    /// A missing key is an empty collection. Records persisted without an id
    /// are assigned one and the collection is written back once.
    pub fn load_all(&self) -> Result<Vec<MeasurementRecord>> {
        let Some(raw) = self.storage.get_item(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() || raw.trim() == "null" {
            return Ok(Vec::new());
        }

        let mut records: Vec<MeasurementRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse records stored under '{}'", STORAGE_KEY))?;

        let missing_ids = records.iter().filter(|r| r.id.is_nil()).count();
        if missing_ids > 0 {
            log::warn!("Assigning ids to {} record(s) stored without one", missing_ids);
            for record in records.iter_mut().filter(|r| r.id.is_nil()) {
                record.id = Uuid::new_v4();
            }
            self.save_all(&records)?;
        }

        Ok(records)
    }

    /// Overwrites the persisted collection wholesale
    pub fn save_all(&self, records: &[MeasurementRecord]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.storage.set_item(STORAGE_KEY, &json)?;
        log::debug!("Saved {} record(s)", records.len());
        Ok(())
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Appends a record to the end of storage order
    pub fn append(&self, mut record: MeasurementRecord) -> Result<MeasurementRecord> {
        if record.id.is_nil() {
            record.id = Uuid::new_v4();
        }
        let mut records = self.load_all()?;
        records.push(record.clone());
        self.save_all(&records)?;
        log::info!("Added record for '{}'", record.name);
        Ok(record)
    }

    /// Overwrites the record at a storage-order index
    pub fn replace_at(&self, storage_index: usize, record: MeasurementRecord) -> Result<()> {
        let mut records = self.load_all()?;
        let len = records.len();
        let slot = records.get_mut(storage_index).ok_or(StoreError::IndexOutOfRange {
            index: storage_index,
            len,
        })?;
        *slot = record;
        self.save_all(&records)?;
        log::info!("Replaced record at storage index {}", storage_index);
        Ok(())
    }

    /// Removes the record shown at `display_index` (0 = most recent)
    pub fn remove_at(&self, display_index: usize) -> Result<MeasurementRecord> {
        let mut records = self.load_all()?;
        let len = records.len();
        let storage_index = display_to_storage_index(len, display_index).ok_or(
            StoreError::DisplayIndexOutOfRange {
                index: display_index,
                len,
            },
        )?;
        let removed = records.remove(storage_index);
        self.save_all(&records)?;
        log::info!("Deleted record for '{}'", removed.name);
        Ok(removed)
    }

    /// Gets a record by its stable id
    pub fn get_by_id(&self, id: &RecordId) -> Result<Option<MeasurementRecord>> {
        Ok(self.load_all()?.into_iter().find(|r| &r.id == id))
    }

    /// Gets the record shown at `display_index`
    pub fn get_at_display(&self, display_index: usize) -> Result<MeasurementRecord> {
        let mut records = self.load_all()?;
        let len = records.len();
        let storage_index = display_to_storage_index(len, display_index).ok_or(
            StoreError::DisplayIndexOutOfRange {
                index: display_index,
                len,
            },
        )?;
        Ok(records.swap_remove(storage_index))
    }

    /// Overwrites the record with the given id in place, keeping its position.
    /// The stored record keeps `id` even if `record` carries another one.
    pub fn replace_by_id(&self, id: &RecordId, mut record: MeasurementRecord) -> Result<()> {
        let mut records = self.load_all()?;
        let pos = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(StoreError::NotFound(*id))?;
        record.id = *id;
        records[pos] = record;
        self.save_all(&records)?;
        log::info!("Updated record {}", id);
        Ok(())
    }

    /// Removes the record with the given id
    pub fn remove_by_id(&self, id: &RecordId) -> Result<MeasurementRecord> {
        let mut records = self.load_all()?;
        let pos = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(StoreError::NotFound(*id))?;
        let removed = records.remove(pos);
        self.save_all(&records)?;
        log::info!("Deleted record {}", id);
        Ok(removed)
    }

    /// Removes the whole collection
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    fn record(name: &str) -> MeasurementRecord {
        MeasurementRecord::new(name.to_string(), "08012345678".to_string())
    }

    fn names<S: KeyValueStorage>(store: &RecordStore<S>) -> Vec<String> {
        store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    fn abc_store() -> RecordStore<MemoryStorage> {
        let store = RecordStore::new(MemoryStorage::new());
        for name in ["A", "B", "C"] {
            store.append(record(name)).unwrap();
        }
        store
    }

    #[test]
    fn test_empty_storage_loads_empty() {
        let store = RecordStore::new(MemoryStorage::new());
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_round_trip_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        let inputs: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| record(n)).collect();

        let store = RecordStore::new(FileStorage::new(&path));
        for r in &inputs {
            store.append(r.clone()).unwrap();
        }

        let reopened = RecordStore::new(FileStorage::new(&path));
        assert_eq!(reopened.load_all().unwrap(), inputs);
    }

    #[test]
    fn test_remove_at_translates_display_index() {
        let store = abc_store();
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(names(&store), vec!["A", "C"]);
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let store = abc_store();
        let err = store.remove_at(3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::DisplayIndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(names(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_replace_at_storage_index() {
        let store = abc_store();
        store.replace_at(0, record("A2")).unwrap();
        assert_eq!(names(&store), vec!["A2", "B", "C"]);
        assert!(store.replace_at(5, record("X")).is_err());
    }

    #[test]
    fn test_replace_by_id_keeps_position_and_id() {
        let store = abc_store();
        let c = store.get_at_display(0).unwrap();
        assert_eq!(c.name, "C");

        store.replace_by_id(&c.id, record("C2")).unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records[2].name, "C2");
        assert_eq!(records[2].id, c.id);
        assert_eq!(names(&store), vec!["A", "B", "C2"]);
    }

    #[test]
    fn test_remove_by_id_unknown() {
        let store = abc_store();
        let id = Uuid::new_v4();
        let err = store.remove_by_id(&id).unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::NotFound(id)));
    }

    #[test]
    fn test_legacy_records_get_ids_once() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                STORAGE_KEY,
                r#"[{"name":"Old","phone":"08000000000","timestamp":"x"}]"#,
            )
            .unwrap();
        let store = RecordStore::new(storage);

        let first = store.load_all().unwrap();
        let second = store.load_all().unwrap();
        assert!(!first[0].id.is_nil());
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_clear() {
        let store = abc_store();
        store.clear().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_display_to_storage_index() {
        assert_eq!(display_to_storage_index(3, 0), Some(2));
        assert_eq!(display_to_storage_index(3, 2), Some(0));
        assert_eq!(display_to_storage_index(3, 3), None);
        assert_eq!(display_to_storage_index(0, 0), None);
    }
}
