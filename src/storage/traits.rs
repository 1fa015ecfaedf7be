//! Media store contract and associated error types

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored exercise video, keyed uniquely by exercise name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    pub name: String,
    pub video_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistent store of exercise media
///
/// `upsert` is idempotent by name and last-write-wins: it creates unknown
/// names and replaces the video URL of known ones without keeping history.
/// Implementations must tolerate concurrent calls from several crawl jobs.
pub trait MediaStore: Send + Sync {
    /// Inserts or replaces the video URL stored for `name`
    fn upsert(&self, name: &str, video_url: &str) -> StorageResult<MediaRecord>;

    /// Gets the record stored for `name`
    fn get(&self, name: &str) -> StorageResult<Option<MediaRecord>>;

    /// Lists every record ordered by name
    fn list(&self) -> StorageResult<Vec<MediaRecord>>;
}
