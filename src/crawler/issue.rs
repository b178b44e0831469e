use crate::crawler::fetcher::FetchError;
use crate::crawler::parser::{ParseError, RecordError};
use thiserror::Error;

/// A non-fatal problem met while crawling one page
///
/// Issues are logged as they arrive and returned with the run report; none
/// of them stops sibling pages.
#[derive(Debug, Error)]
pub enum CrawlIssue {
    #[error("page {page}: {source}")]
    Fetch { page: u32, source: FetchError },

    #[error("page {page}: {source}")]
    Parse { page: u32, source: ParseError },

    #[error("page {page}: {source}")]
    Record { page: u32, source: RecordError },

    #[error("page worker failed: {message}")]
    Worker { message: String },
}

impl CrawlIssue {
    /// The listing page this issue belongs to, when known
    pub fn page(&self) -> Option<u32> {
        match self {
            CrawlIssue::Fetch { page, .. }
            | CrawlIssue::Parse { page, .. }
            | CrawlIssue::Record { page, .. } => Some(*page),
            CrawlIssue::Worker { .. } => None,
        }
    }
}
