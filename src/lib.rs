//! Forum-Sweep: a forum listing crawler
//!
//! This crate crawls the paginated listing of a single web forum, extracts
//! post records from the HTML, deduplicates them against everything already
//! stored and persists only the new ones. A small HTTP API serves the stored
//! posts back with pagination.

pub mod config;
pub mod crawler;
pub mod server;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Forum-Sweep operations
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Failed to load known posts, run aborted: {source}")]
    Preload { source: storage::StorageError },

    #[error("Failed to persist {pending} new posts: {source}")]
    Persist {
        pending: usize,
        source: storage::StorageError,
    },

    #[error("Page count must be at least 1, got {0}")]
    InvalidPageCount(u32),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RunOutcome, RunReport};
pub use storage::{PostRecord, SqliteStorage, Storage};
