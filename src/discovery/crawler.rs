//! Category crawler - paginates a listing page and collects product URLs
//!
//! Drives the navigation controller through a category's pages, collecting
//! unique product URLs in first-seen order until the target count, the end
//! of the catalog, or the page-count safety ceiling is reached.

use crate::browser::PageDriver;
use crate::config::{CrawlerConfig, SiteConfig};
use crate::discovery::matchers::{
    next_page_url, product_card_links, url_shape_links, ProductUrlShape,
};
use crate::navigation::NavigationController;
use crate::ConfigError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors surfaced by category discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The very first listing page could not be reached past the gate;
    /// distinct from an exhausted catalog
    #[error("Discovery blocked on first listing page: {url}")]
    Blocked { url: String },

    #[error("Invalid category URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Driver(#[from] crate::browser::DriverError),
}

/// Collects product URLs from a paginated category listing
pub struct CategoryCrawler<'a, D> {
    controller: &'a mut NavigationController<D>,
    shape: ProductUrlShape,
    card_selector: Selector,
    next_selector: Selector,
    max_retries: u32,
    max_pages: u32,
}

impl<'a, D: PageDriver> CategoryCrawler<'a, D> {
    /// Creates a crawler borrowing the session's navigation controller
    pub fn new(
        controller: &'a mut NavigationController<D>,
        site: &SiteConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, ConfigError> {
        let shape = ProductUrlShape::new(&site.product_url_pattern)?;

        let card_selector = Selector::parse(&site.product_card_selector)
            .map_err(|e| ConfigError::InvalidPattern(format!("product_card_selector: {e}")))?;

        let next_selector = Selector::parse(&site.next_page_selector)
            .map_err(|e| ConfigError::InvalidPattern(format!("next_page_selector: {e}")))?;

        Ok(Self {
            controller,
            shape,
            card_selector,
            next_selector,
            max_retries: crawler.max_retries,
            max_pages: crawler.max_category_pages,
        })
    }

    /// Discovers up to `max_count` unique product URLs
    ///
    /// Order is first-seen: the card matcher's hits precede the shape
    /// matcher's within one page, earlier pages precede later ones.
    pub async fn discover(
        &mut self,
        category_url: &str,
        max_count: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        let base = Url::parse(category_url)
            .map_err(|_| DiscoveryError::InvalidUrl(category_url.to_string()))?;

        let mut urls: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = category_url.to_string();

        for page_index in 1..=self.max_pages {
            let nav = self
                .controller
                .navigate_with_retry(&current, self.max_retries)
                .await?;

            if !nav.success {
                if page_index == 1 {
                    return Err(DiscoveryError::Blocked { url: current });
                }
                tracing::warn!(
                    "Listing page {} blocked mid-catalog, keeping {} URL(s)",
                    page_index,
                    urls.len()
                );
                break;
            }

            let html_text = match self.controller.driver_mut().page_source().await {
                Ok(h) => h,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Could not read listing page {}: {}", page_index, e);
                    break;
                }
            };

            let page_base = Url::parse(&current).unwrap_or_else(|_| base.clone());
            let html = Html::parse_document(&html_text);

            let card_hits = product_card_links(&html, &page_base, &self.card_selector);
            let shape_hits = url_shape_links(&html, &page_base, &self.shape);

            let before = urls.len();
            for candidate in card_hits.into_iter().chain(shape_hits) {
                if !self.shape.matches(&candidate) {
                    continue;
                }
                if seen.insert(candidate.clone()) {
                    urls.push(candidate);
                }
            }

            tracing::debug!(
                "Listing page {}: {} new product URL(s), {} total",
                page_index,
                urls.len() - before,
                urls.len()
            );

            if urls.len() >= max_count {
                urls.truncate(max_count);
                tracing::info!("Reached target count of {} product URL(s)", max_count);
                return Ok(urls);
            }

            match next_page_url(&html, &page_base, &self.next_selector) {
                Some(next) => current = next,
                None => {
                    tracing::debug!("No next-page control on page {}; catalog exhausted", page_index);
                    return Ok(urls);
                }
            }
        }

        tracing::warn!(
            "Stopped at the page safety ceiling ({}) with {} URL(s)",
            self.max_pages,
            urls.len()
        );
        Ok(urls)
    }
}
