//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the MediaStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{MediaRecord, MediaStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// The connection sits behind a mutex so one storage value can be shared by
/// concurrently running crawl jobs; upserts are serialized.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Counts stored records
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl MediaStore for SqliteStorage {
    fn upsert(&self, name: &str, video_url: &str) -> StorageResult<MediaRecord> {
        if name.trim().is_empty() {
            return Err(StorageError::ConstraintViolation(
                "media name cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO media (name, video_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(name) DO UPDATE SET video_url = excluded.video_url,
             updated_at = excluded.updated_at",
            params![name, video_url, now.to_rfc3339()],
        )?;

        Ok(MediaRecord {
            name: name.to_string(),
            video_url: video_url.to_string(),
            updated_at: now,
        })
    }

    fn get(&self, name: &str) -> StorageResult<Option<MediaRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT name, video_url, updated_at FROM media WHERE name = ?1",
                params![name],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self) -> StorageResult<Vec<MediaRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name, video_url, updated_at FROM media ORDER BY name")?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let updated_at: String = row.get(2)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(MediaRecord {
        name: row.get(0)?,
        video_url: row.get(1)?,
        updated_at,
    })
}
