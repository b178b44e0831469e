//! Crawler module for listing page fetching and processing
//!
//! This module contains the crawl pipeline:
//! - HTTP fetching of listing pages
//! - HTML parsing into post records
//! - Deduplication against the known-post index
//! - Run coordination and periodic scheduling

mod aggregator;
mod coordinator;
mod fetcher;
mod issue;
mod parser;
mod schedule;

pub use aggregator::{AggregateTally, Aggregator};
pub use coordinator::{Coordinator, RunOutcome, RunReport};
pub use fetcher::{build_http_client, FetchError, PageFetcher};
pub use issue::CrawlIssue;
pub use parser::{
    normalize_title, parse_listing, ListingLayout, ParseError, ParsedListing, RecordError,
};
pub use schedule::spawn_periodic;

use crate::config::Config;
use crate::storage::SharedStorage;
use crate::ForumError;

/// Runs a single crawl with the configured page count
///
/// Convenience entry point for one-shot use; long-running processes should
/// keep one [`Coordinator`] so its run guard covers every caller.
///
/// # Example
///
/// ```no_run
/// use forum_sweep::config::Config;
/// use forum_sweep::crawler::crawl_once;
/// use forum_sweep::storage::{open_storage, share};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let storage = share(open_storage(Path::new(&config.database.path))?);
/// let outcome = crawl_once(&config, storage).await?;
/// println!("{} new posts", outcome.new_posts());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_once(config: &Config, storage: SharedStorage) -> Result<RunOutcome, ForumError> {
    let coordinator = Coordinator::new(config, storage)?;
    coordinator.run_crawl(config.crawler.page_count).await
}
