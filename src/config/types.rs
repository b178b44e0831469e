use serde::Deserialize;
use std::time::Duration;

/// Listing page of the board crawled when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://gall.dcinside.com/board/lists/?id=ohmygirl&page=";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Main configuration structure for Forum-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub listing: ListingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Listing URL; the page index is appended verbatim
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of listing pages fetched per run (pages 1..=page_count)
    #[serde(rename = "page-count")]
    pub page_count: u32,

    /// Whole-request timeout for one page fetch (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Idle connections kept per host in the client pool
    #[serde(rename = "max-idle-per-host")]
    pub max_idle_per_host: usize,

    /// Capacity of the candidate and issue channels
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_count: 10,
            request_timeout_secs: 10,
            connect_timeout_secs: 10,
            max_idle_per_host: 10,
            channel_capacity: 64,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }
}

/// Where post fields live in the listing markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// One element per post row
    #[serde(rename = "row-selector")]
    pub row_selector: String,

    /// Row attribute holding the numeric post id
    #[serde(rename = "id-attribute")]
    pub id_attribute: String,

    /// Row attribute holding the post category
    #[serde(rename = "category-attribute")]
    pub category_attribute: String,

    #[serde(rename = "title-selector")]
    pub title_selector: String,

    #[serde(rename = "author-selector")]
    pub author_selector: String,

    /// Cell carrying the publication timestamp
    #[serde(rename = "date-selector")]
    pub date_selector: String,

    /// Attribute of the date cell with the full timestamp
    #[serde(rename = "date-attribute")]
    pub date_attribute: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            row_selector: "tr.us-post".to_string(),
            id_attribute: "data-no".to_string(),
            category_attribute: "data-type".to_string(),
            title_selector: "td.gall_tit > a".to_string(),
            author_selector: "td.gall_writer > span > em".to_string(),
            date_selector: "td.gall_date".to_string(),
            date_attribute: "title".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "posts.db".to_string(),
        }
    }
}

/// Read API listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Periodic crawl runs while serving
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,

    #[serde(rename = "interval-hours")]
    pub interval_hours: u64,

    /// Start the first run immediately instead of after one interval
    #[serde(rename = "run-on-start")]
    pub run_on_start: bool,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            run_on_start: true,
        }
    }
}
