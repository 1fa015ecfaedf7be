//! Storage module for persisting exercise media
//!
//! The crawler only depends on the `MediaStore` trait. `SqliteStorage` is
//! the implementation the service binary runs with.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{MediaRecord, MediaStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (creating if needed) the SQLite media database at `path`
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}
