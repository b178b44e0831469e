use crate::config::types::{
    Config, CrawlerConfig, DatabaseConfig, ListingConfig, ScheduleConfig, ServerConfig,
};
use crate::crawler::ListingLayout;
use crate::{ConfigError, ConfigResult};
use reqwest::header::HeaderValue;
use url::Url;

/// Upper bound on pages per run; one task is spawned per page
pub const MAX_PAGE_COUNT: u32 = 1000;

/// Longest schedule interval, one year
const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_listing_config(&config.listing)?;
    validate_database_config(&config.database)?;
    validate_server_config(&config.server)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.page_count < 1 || config.page_count > MAX_PAGE_COUNT {
        return Err(ConfigError::Validation(format!(
            "page-count must be between 1 and {}, got {}",
            MAX_PAGE_COUNT, config.page_count
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel-capacity must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("user-agent", &config.user_agent),
        ("accept-language", &config.accept_language),
    ] {
        if HeaderValue::from_str(value).is_err() {
            return Err(ConfigError::Validation(format!(
                "{} is not a valid HTTP header value: {:?}",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_listing_config(config: &ListingConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("id-attribute", &config.id_attribute),
        ("category-attribute", &config.category_attribute),
        ("date-attribute", &config.date_attribute),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    // Compiling the layout checks every selector
    ListingLayout::from_config(config)?;
    Ok(())
}

fn validate_database_config(config: &DatabaseConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> ConfigResult<()> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server host cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_schedule_config(config: &ScheduleConfig) -> ConfigResult<()> {
    if config.interval_hours < 1 || config.interval_hours > MAX_INTERVAL_HOURS {
        return Err(ConfigError::Validation(format!(
            "interval-hours must be between 1 and {}, got {}",
            MAX_INTERVAL_HOURS, config.interval_hours
        )));
    }
    Ok(())
}
