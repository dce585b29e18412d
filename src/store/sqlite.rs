//! SQLite record store.
//!
//! Processed content is kept as a JSON text column, written once and returned
//! verbatim on every read.

use super::{NewRecord, RecordStore, StoredRecord};
use crate::content::ProcessedData;
use crate::error::{RecastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS processed_transcripts (
        id TEXT PRIMARY KEY,
        file_name TEXT NOT NULL,
        original_transcript TEXT NOT NULL,
        processed_data TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_processed_transcripts_created_at
        ON processed_transcripts(created_at);
"#;

/// Raw columns of a row, converted outside the rusqlite closure.
type RawRow = (String, String, String, String, String);

/// SQLite record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open or create a database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite record store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RecastError::Persistence(format!("Failed to acquire lock: {}", e)))
    }

    fn decode((id, file_name, original_transcript, data, created_at): RawRow) -> Result<StoredRecord> {
        let id = Uuid::parse_str(&id)
            .map_err(|e| RecastError::Persistence(format!("Corrupt record id {}: {}", id, e)))?;
        let processed_data: ProcessedData = serde_json::from_str(&data)
            .map_err(|e| RecastError::Persistence(format!("Corrupt processed data for {}: {}", id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RecastError::Persistence(format!("Corrupt timestamp for {}: {}", id, e)))?;

        Ok(StoredRecord {
            id,
            file_name,
            original_transcript,
            processed_data,
            created_at,
        })
    }
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn persistence(e: rusqlite::Error) -> RecastError {
    RecastError::Persistence(e.to_string())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self, record), fields(file = %record.file_name))]
    async fn save(&self, record: NewRecord) -> Result<StoredRecord> {
        let id = Uuid::new_v4();
        let data = serde_json::to_string(&record.processed_data)?;
        // fixed precision keeps text ordering equal to time ordering
        let created_at = record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO processed_transcripts
            (id, file_name, original_transcript, processed_data, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                id.to_string(),
                record.file_name,
                record.original_transcript,
                data,
                created_at,
            ],
        )
        .map_err(persistence)?;
        drop(conn);

        debug!("Saved record {}", id);
        let mut stored = StoredRecord::from_new(id, record);
        stored.created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(stored.created_at);
        Ok(stored)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<StoredRecord> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, file_name, original_transcript, processed_data, created_at
                FROM processed_transcripts
                WHERE id = ?1
                "#,
                params![id.to_string()],
                raw_row,
            )
            .optional()
            .map_err(persistence)?;

        match row {
            Some(row) => Self::decode(row),
            None => Err(RecastError::NotFound(id.to_string())),
        }
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, file_name, original_transcript, processed_data, created_at
                FROM processed_transcripts
                ORDER BY created_at DESC, rowid DESC
                "#,
            )
            .map_err(persistence)?;

        let rows = stmt
            .query_map([], raw_row)
            .map_err(persistence)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(persistence)?;

        rows.into_iter().map(Self::decode).collect()
    }
}
