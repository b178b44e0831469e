//! Periodic crawl runs
//!
//! While the read API is being served, crawls are triggered on a fixed
//! interval. A tick that lands while a run is still going is skipped by the
//! coordinator's run guard, and missed ticks are not replayed.

use crate::crawler::coordinator::{Coordinator, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_secs(1);
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Spawns a task that runs a crawl every `every`
///
/// With `run_immediately` the first run starts right away, otherwise after
/// one full interval. `every` is clamped to between one second and one
/// year. The task runs until aborted.
pub fn spawn_periodic(
    coordinator: Arc<Coordinator>,
    every: Duration,
    page_count: u32,
    run_immediately: bool,
) -> JoinHandle<()> {
    let every = every.clamp(MIN_PERIOD, MAX_PERIOD);

    tokio::spawn(async move {
        let now = Instant::now();
        let start = if run_immediately {
            now
        } else {
            now + every
        };
        let mut interval = tokio::time::interval_at(start, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            every_secs = every.as_secs(),
            pages = page_count,
            "Crawl schedule started"
        );

        loop {
            interval.tick().await;

            match coordinator.run_crawl(page_count).await {
                Ok(RunOutcome::Completed(report)) => {
                    tracing::info!(
                        new_posts = report.new_posts,
                        issues = report.issues.len(),
                        "Scheduled crawl completed"
                    );
                }
                Ok(RunOutcome::Skipped) => {
                    tracing::info!("Scheduled crawl skipped, previous run still active");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled crawl failed");
                }
            }
        }
    })
}
