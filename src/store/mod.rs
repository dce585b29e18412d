//! Record store for processed transcripts.
//!
//! Provides a trait-based interface over storage backends. Records are
//! immutable once saved.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::config::Settings;
use crate::content::ProcessedData;
use crate::error::{RecastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Number of records shown as recent activity.
pub const RECENT_LIMIT: usize = 3;

/// A record to be saved.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub file_name: String,
    pub original_transcript: String,
    pub processed_data: ProcessedData,
    pub created_at: DateTime<Utc>,
}

/// A saved record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub file_name: String,
    pub original_transcript: String,
    pub processed_data: ProcessedData,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    fn from_new(id: Uuid, record: NewRecord) -> Self {
        Self {
            id,
            file_name: record.file_name,
            original_transcript: record.original_transcript,
            processed_data: record.processed_data,
            created_at: record.created_at,
        }
    }
}

/// Trait for record store implementations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Save a record and assign it a unique id.
    async fn save(&self, record: NewRecord) -> Result<StoredRecord>;

    /// Get a record by id. Fails with `NotFound` for unknown ids.
    async fn get_by_id(&self, id: &Uuid) -> Result<StoredRecord>;

    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<StoredRecord>>;
}

/// Create a record store from settings.
pub fn create_store(settings: &Settings) -> Result<Arc<dyn RecordStore>> {
    match settings.store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteRecordStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryRecordStore::new())),
        other => Err(RecastError::Config(format!(
            "Unknown store provider: {}. Use sqlite or memory.",
            other
        ))),
    }
}

/// Parse a record id; malformed ids are reported as not found.
pub fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| RecastError::NotFound(id.to_string()))
}

/// Short listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredRecord> for RecordSummary {
    fn from(record: &StoredRecord) -> Self {
        Self {
            id: record.id,
            file_name: record.file_name.clone(),
            created_at: record.created_at,
        }
    }
}

/// Aggregate counts over all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_processed: usize,
    /// Records created in the calendar month of `now`.
    pub this_month: usize,
    pub recent: Vec<RecordSummary>,
}

impl Stats {
    /// Compute stats from records ordered newest first.
    pub fn from_records(records: &[StoredRecord], now: DateTime<Utc>) -> Self {
        Self {
            total_processed: records.len(),
            this_month: records
                .iter()
                .filter(|r| r.created_at.year() == now.year() && r.created_at.month() == now.month())
                .count(),
            recent: records.iter().take(RECENT_LIMIT).map(RecordSummary::from).collect(),
        }
    }
}
