//! Database schema definitions
//!
//! Column names match the JSON field names served by the read API.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per forum post, keyed by the site-assigned post number
CREATE TABLE IF NOT EXISTS posts (
    post_number INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    writer TEXT NOT NULL,
    write_date TEXT NOT NULL,
    data_type TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
