//! Listing page parser
//!
//! Turns the HTML of one listing page into post records. Problems are
//! scoped as narrowly as possible:
//! - an empty body fails the whole page ([`ParseError`])
//! - a row without a usable post id is rejected on its own ([`RecordError`])
//!   while the remaining rows of the page are still extracted
//!
//! Bytes that are not valid UTF-8 are replaced rather than failing the page.

use crate::config::ListingConfig;
use crate::storage::PostRecord;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use std::num::ParseIntError;
use thiserror::Error;

/// Largest id that fits the storage's signed 64-bit integer key
const MAX_POST_ID: u64 = i64::MAX as u64;

/// The page as a whole could not be parsed
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("page body is empty")]
    EmptyBody,
}

/// One listing row could not be turned into a post
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("row {row}: missing `{attribute}` attribute")]
    MissingId { row: usize, attribute: String },

    #[error("row {row}: invalid post id {value:?}: {source}")]
    InvalidId {
        row: usize,
        value: String,
        source: ParseIntError,
    },

    #[error("row {row}: post id {value} is out of range")]
    IdOutOfRange { row: usize, value: u64 },
}

/// Compiled selectors describing where post fields live in the markup
#[derive(Debug)]
pub struct ListingLayout {
    row: Selector,
    title: Selector,
    author: Selector,
    date: Selector,
    id_attribute: String,
    category_attribute: String,
    date_attribute: String,
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

impl ListingLayout {
    pub fn from_config(config: &ListingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            row: compile_selector(&config.row_selector)?,
            title: compile_selector(&config.title_selector)?,
            author: compile_selector(&config.author_selector)?,
            date: compile_selector(&config.date_selector)?,
            id_attribute: config.id_attribute.clone(),
            category_attribute: config.category_attribute.clone(),
            date_attribute: config.date_attribute.clone(),
        })
    }
}

/// Posts and rejected rows extracted from one listing page
#[derive(Debug, Default)]
pub struct ParsedListing {
    pub posts: Vec<PostRecord>,
    pub rejected: Vec<RecordError>,
}

/// Parses one listing page
///
/// Rows are visited in document order; `row` numbers in errors are
/// 1-based positions among the matched rows.
///
/// # Errors
///
/// Only an empty body fails the page. A page without any matching row
/// yields an empty listing.
pub fn parse_listing(body: &[u8], layout: &ListingLayout) -> Result<ParsedListing, ParseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::EmptyBody);
    }

    let html = String::from_utf8_lossy(body);
    if matches!(html, Cow::Owned(_)) {
        tracing::debug!("listing page contains invalid UTF-8, replaced");
    }
    let document = Html::parse_document(&html);

    let mut listing = ParsedListing::default();
    for (position, row) in document.select(&layout.row).enumerate() {
        match extract_post(row, position + 1, layout) {
            Ok(post) => listing.posts.push(post),
            Err(rejected) => listing.rejected.push(rejected),
        }
    }

    Ok(listing)
}

fn extract_post(
    row: ElementRef<'_>,
    position: usize,
    layout: &ListingLayout,
) -> Result<PostRecord, RecordError> {
    let raw_id = row
        .value()
        .attr(&layout.id_attribute)
        .ok_or_else(|| RecordError::MissingId {
            row: position,
            attribute: layout.id_attribute.clone(),
        })?;

    let id = raw_id
        .trim()
        .parse::<u64>()
        .map_err(|source| RecordError::InvalidId {
            row: position,
            value: raw_id.to_string(),
            source,
        })?;

    if id > MAX_POST_ID {
        return Err(RecordError::IdOutOfRange {
            row: position,
            value: id,
        });
    }

    // Every matching element contributes, so a reply counter link next to
    // the title ends up in the raw title and is cut by normalization
    let raw_title: String = row.select(&layout.title).flat_map(|e| e.text()).collect();

    let author: String = row.select(&layout.author).flat_map(|e| e.text()).collect();

    let published_at = row
        .select(&layout.date)
        .next()
        .and_then(|cell| cell.value().attr(&layout.date_attribute))
        .unwrap_or_default()
        .to_string();

    let category = row
        .value()
        .attr(&layout.category_attribute)
        .unwrap_or_default()
        .to_string();

    Ok(PostRecord {
        id,
        title: normalize_title(&raw_title),
        author,
        published_at,
        category,
    })
}

/// Normalizes a raw listing title
///
/// The forum appends bracketed tags such as reply counts. When the trimmed
/// title contains a `[` with a `]` somewhere after it, only the text before
/// the first `[` is kept (trimmed); otherwise the trimmed title is returned.
///
/// ```
/// use forum_sweep::crawler::normalize_title;
///
/// assert_eq!(normalize_title("Hello [tag] World"), "Hello");
/// assert_eq!(normalize_title("[Notice] Welcome"), "");
/// assert_eq!(normalize_title("  Plain title "), "Plain title");
/// ```
pub fn normalize_title(raw: &str) -> String {
    let title = raw.trim();

    match title.find('[') {
        Some(open) if title[open..].contains(']') => title[..open].trim().to_string(),
        _ => title.to_string(),
    }
}
