//! Forum-Sweep main entry point
//!
//! Command-line interface for crawling the forum listing and serving the
//! collected posts.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forum_sweep::config::{load_config_with_hash, validate, Config, MAX_PAGE_COUNT};
use forum_sweep::crawler::{crawl_once, spawn_periodic, Coordinator, RunOutcome, RunReport};
use forum_sweep::server;
use forum_sweep::storage::{open_storage, share, SharedStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Forum-Sweep: crawl, deduplicate and serve forum listing posts
#[derive(Parser, Debug)]
#[command(name = "forum-sweep")]
#[command(version = "1.0.0")]
#[command(about = "Crawls a forum listing and serves the collected posts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single crawl and exit
    Crawl {
        /// Number of listing pages to crawl (overrides crawler.page-count)
        #[arg(long, value_parser = pages_parser())]
        pages: Option<u32>,
    },

    /// Serve the read API and crawl on a schedule
    Serve {
        /// Number of listing pages per scheduled crawl
        #[arg(long, value_parser = pages_parser())]
        pages: Option<u32>,

        /// Serve only, never crawl
        #[arg(long)]
        no_schedule: bool,
    },

    /// Validate the configuration and print the effective settings
    Check,
}

/// `--pages` takes the same range as `crawler.page-count`
fn pages_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_COUNT))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl { pages } => handle_crawl(config, pages).await,
        Command::Serve { pages, no_schedule } => handle_serve(config, pages, no_schedule).await,
        Command::Check => {
            print_settings(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_sweep=info,warn"),
            1 => EnvFilter::new("forum_sweep=debug,info"),
            2 => EnvFilter::new("forum_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("built-in configuration is invalid")?;
            tracing::info!("No configuration file given, using defaults");
            Ok(config)
        }
    }
}

fn open_shared(config: &Config) -> anyhow::Result<SharedStorage> {
    let path = Path::new(&config.database.path);
    let storage = open_storage(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    Ok(share(storage))
}

/// Handles the `crawl` subcommand
async fn handle_crawl(mut config: Config, pages: Option<u32>) -> anyhow::Result<()> {
    if let Some(pages) = pages {
        config.crawler.page_count = pages;
    }
    let storage = open_shared(&config)?;

    tracing::info!(
        "Crawling {} pages from {}",
        config.crawler.page_count,
        config.crawler.base_url
    );

    match crawl_once(&config, storage).await.context("crawl failed")? {
        RunOutcome::Completed(report) => print_report(&report),
        RunOutcome::Skipped => println!("Another crawl is already running"),
    }
    Ok(())
}

/// Handles the `serve` subcommand
async fn handle_serve(config: Config, pages: Option<u32>, no_schedule: bool) -> anyhow::Result<()> {
    let storage = open_shared(&config)?;

    let schedule = if no_schedule || !config.schedule.enabled {
        tracing::info!("Crawl schedule disabled");
        None
    } else {
        let coordinator = Arc::new(
            Coordinator::new(&config, Arc::clone(&storage))
                .context("failed to set up the crawler")?,
        );
        Some(spawn_periodic(
            coordinator,
            config.schedule.interval(),
            pages.unwrap_or(config.crawler.page_count),
            config.schedule.run_on_start,
        ))
    };

    let addr = config.server.bind_address();
    let served = server::serve(&addr, storage, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutdown requested");
    })
    .await;

    if let Some(schedule) = schedule {
        schedule.abort();
    }

    served.with_context(|| format!("server on {} failed", addr))
}

fn print_report(report: &RunReport) {
    println!("=== Crawl Summary ===\n");
    println!("Pages requested:   {}", report.pages);
    println!("Known before run:  {}", report.known_before);
    println!("Candidates:        {}", report.candidates);
    println!("Duplicates:        {}", report.duplicates);
    println!("New posts:         {}", report.new_posts);
    println!("Inserted:          {}", report.inserted);
    println!(
        "Duration:          {:.2}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );

    let failed = report.failed_pages();
    if !failed.is_empty() {
        println!("Failed pages:      {:?}", failed);
    }
    if !report.issues.is_empty() {
        println!("\nIssues ({}):", report.issues.len());
        for issue in &report.issues {
            println!("  - {}", issue);
        }
    }
}

/// Handles the `check` subcommand
fn print_settings(config: &Config) {
    println!("=== Forum-Sweep Configuration ===\n");

    println!("Crawler:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Pages per run: {}", config.crawler.page_count);
    println!(
        "  Timeouts: request {}s, connect {}s",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!("  Channel capacity: {}", config.crawler.channel_capacity);

    println!("\nListing:");
    println!("  Rows: {}", config.listing.row_selector);
    println!("  Title: {}", config.listing.title_selector);
    println!("  Author: {}", config.listing.author_selector);
    println!(
        "  Date: {} [{}]",
        config.listing.date_selector, config.listing.date_attribute
    );

    println!("\nDatabase: {}", config.database.path);
    println!("Server: {}", config.server.bind_address());

    if config.schedule.enabled {
        println!(
            "Schedule: every {}h (run on start: {})",
            config.schedule.interval_hours, config.schedule.run_on_start
        );
    } else {
        println!("Schedule: disabled");
    }

    println!("\n✓ Configuration is valid");
}
