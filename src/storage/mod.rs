//! Storage module for persisting crawled posts
//!
//! This module owns everything that touches the database:
//! - SQLite initialization and schema management
//! - Bulk loading of all known posts at the start of a run
//! - Transactional insert-or-ignore of newly discovered posts
//! - Paginated reads for the HTTP API

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::ForumError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// One listing entry of the forum
///
/// `id` is assigned by the forum and is the only deduplication key; every
/// other field may repeat across posts. The serialized field names are the
/// ones the web client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "post_number")]
    pub id: u64,

    pub title: String,

    #[serde(rename = "writer")]
    pub author: String,

    /// Site-provided timestamp, kept as an opaque string
    #[serde(rename = "write_date")]
    pub published_at: String,

    #[serde(rename = "data_type")]
    pub category: String,
}

/// Process-wide storage handle shared by the crawler and the HTTP API
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Wraps a storage backend for sharing across tasks
pub fn share<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Opens (or creates) the SQLite database at `path`
///
/// # Errors
///
/// Returns `ForumError::Storage` if the file cannot be opened or the schema
/// cannot be created.
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ForumError> {
    Ok(SqliteStorage::new(path)?)
}

/// Runs a blocking storage operation on the blocking thread pool
///
/// The lock is held for the duration of `op`, so callers never observe a
/// half-applied transaction.
pub async fn with_storage<T, F>(storage: &SharedStorage, op: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut (dyn Storage + Send)) -> StorageResult<T> + Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || {
        let mut guard = storage.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut *guard)
    })
    .await
    .map_err(|e| StorageError::Task(e.to_string()))?
}
