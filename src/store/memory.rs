//! In-memory record store.
//!
//! Useful for testing and for the `memory` store provider.

use super::{NewRecord, RecordStore, StoredRecord};
use crate::error::{RecastError, Result};
use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory record store.
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> RecastError {
    RecastError::Persistence(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, record: NewRecord) -> Result<StoredRecord> {
        let stored = StoredRecord::from_new(Uuid::new_v4(), record);
        self.records.write().map_err(poisoned)?.push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<StoredRecord> {
        self.records
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|r| r.id == *id)
            .cloned()
            .ok_or_else(|| RecastError::NotFound(id.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>> {
        let mut records: Vec<StoredRecord> =
            self.records.read().map_err(poisoned)?.iter().rev().cloned().collect();
        // stable: equal timestamps stay newest-saved first
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::record;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_save_and_get() {
        let store = MemoryRecordStore::new();
        let saved = store.save(record("a.txt", Utc::now())).await.unwrap();
        let fetched = store.get_by_id(&saved.id).await.unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = MemoryRecordStore::new();
        let err = store.get_by_id(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RecastError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryRecordStore::new();
        let now = Utc::now();
        store.save(record("old.txt", now - Duration::days(2))).await.unwrap();
        store.save(record("new.txt", now)).await.unwrap();
        store.save(record("mid.txt", now - Duration::days(1))).await.unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        assert_eq!(names, vec!["new.txt", "mid.txt", "old.txt"]);
    }
}
