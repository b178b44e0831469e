//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::PostRecord;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and ensures the schema exists
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened database");
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    let raw_id: i64 = row.get(0)?;
    let id = u64::try_from(raw_id).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw_id))?;

    Ok(PostRecord {
        id,
        title: row.get(1)?,
        author: row.get(2)?,
        published_at: row.get(3)?,
        category: row.get(4)?,
    })
}

impl Storage for SqliteStorage {
    fn load_all(&self) -> StorageResult<HashMap<u64, PostRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT post_number, title, writer, write_date, data_type FROM posts")?;

        let rows = stmt.query_map([], row_to_post)?;

        let mut posts = HashMap::new();
        for row in rows {
            let post = row?;
            posts.insert(post.id, post);
        }

        Ok(posts)
    }

    fn insert_new(&mut self, posts: &[PostRecord]) -> StorageResult<usize> {
        // Dropping the transaction without commit rolls everything back
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO posts (post_number, title, writer, write_date, data_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for post in posts {
                let id = i64::try_from(post.id).map_err(|_| {
                    StorageError::Database(format!(
                        "post id {} exceeds the SQLite integer range",
                        post.id
                    ))
                })?;

                inserted += stmt.execute(params![
                    id,
                    post.title,
                    post.author,
                    post.published_at,
                    post.category,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn query_page(&self, limit: u32, page: u32) -> StorageResult<Vec<PostRecord>> {
        if limit == 0 {
            return Err(StorageError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }
        if page == 0 {
            return Err(StorageError::InvalidQuery(
                "page must be at least 1".to_string(),
            ));
        }

        let offset = (u64::from(page) - 1) * u64::from(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT post_number, title, writer, write_date, data_type FROM posts
             ORDER BY post_number DESC LIMIT ?1 OFFSET ?2",
        )?;

        let posts = stmt
            .query_map(params![i64::from(limit), offset], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    fn count_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
