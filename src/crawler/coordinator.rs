//! Crawler coordinator - one crawl run end to end
//!
//! A run goes through these steps:
//! 1. Take the run guard (an overlapping run is skipped, not an error)
//! 2. Load every stored post into a fresh known-post index
//! 3. Spawn one fetch-and-parse worker per listing page
//! 4. Aggregate candidates and log issues concurrently while a completion
//!    watcher joins the workers and then closes both channels
//! 5. Persist the posts first seen in this run in one transaction
//!
//! Persistence only starts after both channels are closed and drained, so
//! it never sees a partially built new set.

use crate::config::Config;
use crate::crawler::aggregator::{AggregateTally, Aggregator};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::issue::CrawlIssue;
use crate::crawler::parser::{parse_listing, ListingLayout};
use crate::state::{RunContext, RunState};
use crate::storage::{with_storage, PostRecord, SharedStorage};
use crate::ForumError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// How a call to [`Coordinator::run_crawl`] ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Another run was active; nothing was done
    Skipped,
    /// The run went through and its new posts were committed
    Completed(RunReport),
}

impl RunOutcome {
    /// Number of posts persisted by this run (zero when skipped)
    pub fn new_posts(&self) -> usize {
        match self {
            RunOutcome::Skipped => 0,
            RunOutcome::Completed(report) => report.new_posts,
        }
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Listing pages requested
    pub pages: u32,
    /// Posts known before the run started
    pub known_before: usize,
    /// Candidates extracted from all pages
    pub candidates: usize,
    /// Candidates dropped as already known
    pub duplicates: usize,
    /// Size of the new set handed to storage
    pub new_posts: usize,
    /// Rows storage actually inserted
    pub inserted: usize,
    /// Fetch, parse and record problems, in arrival order
    pub issues: Vec<CrawlIssue>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Pages that produced a fetch or parse failure
    pub fn failed_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self
            .issues
            .iter()
            .filter(|issue| {
                matches!(
                    issue,
                    CrawlIssue::Fetch { .. } | CrawlIssue::Parse { .. }
                )
            })
            .filter_map(CrawlIssue::page)
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

/// Runs crawls against one forum and one storage backend
///
/// The coordinator is shared (`Arc<Coordinator>`) between the scheduler and
/// on-demand callers; its run guard keeps their runs from overlapping.
pub struct Coordinator {
    fetcher: PageFetcher,
    layout: Arc<ListingLayout>,
    storage: SharedStorage,
    run_state: RunState,
    channel_capacity: usize,
}

impl Coordinator {
    /// Builds a coordinator from the configuration
    ///
    /// # Errors
    ///
    /// Fails when a listing selector does not compile or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config, storage: SharedStorage) -> Result<Self, ForumError> {
        let fetcher = PageFetcher::from_config(&config.crawler)?;
        let layout = ListingLayout::from_config(&config.listing)?;

        Ok(Self::from_parts(fetcher, layout, storage)
            .with_channel_capacity(config.crawler.channel_capacity))
    }

    pub fn from_parts(fetcher: PageFetcher, layout: ListingLayout, storage: SharedStorage) -> Self {
        Self {
            fetcher,
            layout: Arc::new(layout),
            storage,
            run_state: RunState::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Whether a run is in progress right now
    pub fn is_running(&self) -> bool {
        self.run_state.is_active()
    }

    /// Crawls listing pages `1..=page_count` and persists the new posts
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome::Skipped)` - another run was already active
    /// * `Ok(RunOutcome::Completed(_))` - the new posts were committed
    ///
    /// # Errors
    ///
    /// * `ForumError::InvalidPageCount` - `page_count` is zero
    /// * `ForumError::Preload` - stored posts could not be loaded; nothing
    ///   was fetched
    /// * `ForumError::Persist` - the new posts could not be committed;
    ///   `pending` holds how many were lost
    pub async fn run_crawl(&self, page_count: u32) -> Result<RunOutcome, ForumError> {
        if page_count == 0 {
            return Err(ForumError::InvalidPageCount(page_count));
        }

        // Released on every return path below, after persistence
        let Some(_guard) = self.run_state.try_begin() else {
            tracing::info!("Crawl already running, skipping");
            return Ok(RunOutcome::Skipped);
        };

        let started_at = Utc::now();
        tracing::info!(pages = page_count, "Starting crawl run");

        let known = with_storage(&self.storage, |storage| storage.load_all())
            .await
            .map_err(|source| ForumError::Preload { source })?;
        let known_before = known.len();
        tracing::info!(known = known_before, "Loaded known posts");

        let context = RunContext::new(known);
        let (tally, issues) = self.crawl_pages(&context, page_count).await?;

        let fresh = context.take_fresh();
        let new_posts = fresh.len();
        tracing::info!(
            candidates = tally.received,
            new_posts,
            issues = issues.len(),
            "Crawl finished, persisting new posts"
        );

        let inserted = with_storage(&self.storage, move |storage| storage.insert_new(&fresh))
            .await
            .map_err(|source| ForumError::Persist {
                pending: new_posts,
                source,
            })?;

        let report = RunReport {
            pages: page_count,
            known_before,
            candidates: tally.received,
            duplicates: tally.duplicates,
            new_posts,
            inserted,
            issues,
            started_at,
            finished_at: Utc::now(),
        };

        if report.new_posts > 0 {
            tracing::info!(
                new_posts = report.new_posts,
                inserted = report.inserted,
                elapsed_ms = report.duration().num_milliseconds(),
                "Crawl run completed"
            );
        } else {
            tracing::info!(
                elapsed_ms = report.duration().num_milliseconds(),
                "Crawl run completed, no new posts"
            );
        }

        Ok(RunOutcome::Completed(report))
    }

    /// Fans out one worker per page and drains both channels
    async fn crawl_pages(
        &self,
        context: &RunContext,
        page_count: u32,
    ) -> Result<(AggregateTally, Vec<CrawlIssue>), ForumError> {
        let (post_tx, post_rx) = mpsc::channel(self.channel_capacity);
        let (issue_tx, issue_rx) = mpsc::channel(self.channel_capacity);

        let mut workers = JoinSet::new();
        for page in 1..=page_count {
            workers.spawn(crawl_page(
                self.fetcher.clone(),
                Arc::clone(&self.layout),
                page,
                post_tx.clone(),
                issue_tx.clone(),
            ));
        }

        // The watcher holds the last original senders; both channels close
        // once it has joined every worker
        let watcher = tokio::spawn(watch_completion(workers, post_tx, issue_tx));
        let aggregator = tokio::spawn(Aggregator::new(context.clone()).consume(post_rx));
        let issue_log = tokio::spawn(drain_issues(issue_rx));

        let (tally, issues, watched) = tokio::join!(aggregator, issue_log, watcher);
        watched?;

        Ok((tally?, issues?))
    }
}

/// Fetches and parses one listing page, emitting posts and issues
async fn crawl_page(
    fetcher: PageFetcher,
    layout: Arc<ListingLayout>,
    page: u32,
    posts: mpsc::Sender<PostRecord>,
    issues: mpsc::Sender<CrawlIssue>,
) {
    let body = match fetcher.fetch_page(page).await {
        Ok(body) => body,
        Err(source) => {
            report(&issues, CrawlIssue::Fetch { page, source }).await;
            return;
        }
    };

    let listing = match parse_listing(&body, &layout) {
        Ok(listing) => listing,
        Err(source) => {
            report(&issues, CrawlIssue::Parse { page, source }).await;
            return;
        }
    };

    tracing::debug!(
        page,
        posts = listing.posts.len(),
        rejected = listing.rejected.len(),
        "Parsed listing page"
    );

    for source in listing.rejected {
        report(&issues, CrawlIssue::Record { page, source }).await;
    }

    for post in listing.posts {
        if posts.send(post).await.is_err() {
            tracing::debug!(page, "Candidate channel closed, dropping remaining posts");
            break;
        }
    }
}

async fn report(issues: &mpsc::Sender<CrawlIssue>, issue: CrawlIssue) {
    if let Err(unsent) = issues.send(issue).await {
        tracing::warn!(error = %unsent.0, "Issue channel closed");
    }
}

/// Joins every page worker, then closes both channels by dropping the senders
async fn watch_completion(
    mut workers: JoinSet<()>,
    posts: mpsc::Sender<PostRecord>,
    issues: mpsc::Sender<CrawlIssue>,
) {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            report(
                &issues,
                CrawlIssue::Worker {
                    message: e.to_string(),
                },
            )
            .await;
        }
    }

    drop(posts);
    drop(issues);
}

/// Logs issues as they arrive and hands them back once the channel closes
async fn drain_issues(mut issues: mpsc::Receiver<CrawlIssue>) -> Vec<CrawlIssue> {
    let mut collected = Vec::new();

    while let Some(issue) = issues.recv().await {
        tracing::warn!(page = ?issue.page(), error = %issue, "Crawl issue");
        collected.push(issue);
    }

    collected
}
