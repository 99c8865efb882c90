use crate::config::types::{BrowserConfig, Config, CrawlerConfig, SiteConfig, TargetsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_site_config(&config.site)?;
    validate_targets_config(&config.targets)?;
    Ok(())
}

/// Validates crawler pacing and retry configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be >= 1, got {}",
            config.page_timeout_secs
        )));
    }

    if config.challenge_poll_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "challenge_poll_interval_ms must be >= 100ms, got {}ms",
            config.challenge_poll_interval_ms
        )));
    }

    if config.challenge_wait_ceiling_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "challenge_wait_ceiling_secs must be >= 1, got {}",
            config.challenge_wait_ceiling_secs
        )));
    }

    if config.pre_nav_delay_min_ms > config.pre_nav_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "pre_nav_delay_min_ms ({}) must not exceed pre_nav_delay_max_ms ({})",
            config.pre_nav_delay_min_ms, config.pre_nav_delay_max_ms
        )));
    }

    if config.item_delay_min_ms > config.item_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "item_delay_min_ms ({}) must not exceed item_delay_max_ms ({})",
            config.item_delay_min_ms, config.item_delay_max_ms
        )));
    }

    if config.max_category_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_category_pages must be >= 1, got {}",
            config.max_category_pages
        )));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.profile_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "profile_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site-specific extraction knobs
///
/// Every configured pattern and selector is compiled here so a typo fails
/// at startup rather than mid-crawl.
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let pattern = regex::Regex::new(&config.product_url_pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("product_url_pattern: {e}")))?;

    if pattern.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(
            "product_url_pattern must contain a capture group for the product id".to_string(),
        ));
    }

    scraper::Selector::parse(&config.next_page_selector)
        .map_err(|e| ConfigError::InvalidPattern(format!("next_page_selector: {e}")))?;

    scraper::Selector::parse(&config.product_card_selector)
        .map_err(|e| ConfigError::InvalidPattern(format!("product_card_selector: {e}")))?;

    if config.currency_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "currency_marker cannot be empty".to_string(),
        ));
    }

    if config.embedded_globals.is_empty() {
        return Err(ConfigError::Validation(
            "embedded_globals cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl targets
fn validate_targets_config(config: &TargetsConfig) -> Result<(), ConfigError> {
    if config.categories.is_empty() && config.products.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category or product target is required".to_string(),
        ));
    }

    for target in config.categories.iter().chain(config.products.iter()) {
        let parsed = Url::parse(target)
            .map_err(|_| ConfigError::InvalidUrl(target.clone()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{target} (only http/https targets are supported)"
            )));
        }
    }

    if config.max_products < 1 {
        return Err(ConfigError::Validation(format!(
            "max_products must be >= 1, got {}",
            config.max_products
        )));
    }

    Ok(())
}
