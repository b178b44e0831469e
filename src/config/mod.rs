//! Configuration module for Forum-Sweep
//!
//! Settings come from an optional TOML file. Every key has a default, so an
//! empty file (or no file at all) describes a working crawler for the
//! default forum board.
//!
//! # Example
//!
//! ```no_run
//! use forum_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("forum-sweep.toml")).unwrap();
//! println!("Crawling {} pages per run", config.crawler.page_count);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, DatabaseConfig, ListingConfig, ScheduleConfig, ServerConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, MAX_PAGE_COUNT};
