//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::PostRecord;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence gateway for post records
///
/// Implementations are used behind a mutex, one operation at a time.
pub trait Storage {
    /// Loads every stored post keyed by post id
    fn load_all(&self) -> StorageResult<HashMap<u64, PostRecord>>;

    /// Inserts posts in a single transaction
    ///
    /// Posts whose id is already stored are skipped silently. Either every
    /// insert is committed or none is.
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_new(&mut self, posts: &[PostRecord]) -> StorageResult<usize>;

    /// Returns one page of posts, newest id first
    ///
    /// `limit` and `page` are both 1-based positive values; the offset is
    /// `(page - 1) * limit`.
    fn query_page(&self, limit: u32, page: u32) -> StorageResult<Vec<PostRecord>>;

    /// Total number of stored posts
    fn count_posts(&self) -> StorageResult<u64>;
}
