//! Product URL discovery matchers
//!
//! Two independent matchers feed the category crawler:
//! - a structural matcher walking product-card anchors
//! - a generic URL-shape matcher over every anchor on the page
//!
//! Their union, deduplicated in first-seen order and filtered to the
//! canonical product-detail shape, becomes the discovered URL list.

use crate::{ConfigError, ProductUrlError};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// A target URL that passed the product-detail shape check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUrl {
    /// The absolute URL
    pub url: String,

    /// Product id captured from the URL
    pub id: String,
}

/// Compiled canonical product-detail URL shape
///
/// The pattern's first capture group is the product id.
#[derive(Debug, Clone)]
pub struct ProductUrlShape {
    re: Regex,
}

impl ProductUrlShape {
    /// Compiles the configured pattern
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("product_url_pattern: {e}")))?;
        Ok(Self { re })
    }

    /// True when the URL matches the product-detail shape
    pub fn matches(&self, url: &str) -> bool {
        self.re.is_match(url)
    }

    /// Parses a target into a [`ProductUrl`], rejecting anything that is
    /// not an absolute http(s) URL of the product-detail shape
    pub fn parse(&self, target: &str) -> Result<ProductUrl, ProductUrlError> {
        let parsed =
            Url::parse(target).map_err(|e| ProductUrlError::Parse(format!("{target}: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ProductUrlError::InvalidScheme(parsed.scheme().to_string()));
        }

        let id = self
            .re
            .captures(target)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ProductUrlError::NotProductShaped(target.to_string()))?;

        Ok(ProductUrl {
            url: target.to_string(),
            id,
        })
    }
}

/// Structural matcher: anchors inside product cards
pub fn product_card_links(html: &Html, base_url: &Url, card_selector: &Selector) -> Vec<String> {
    let mut links = Vec::new();

    for element in html.select(card_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute) = resolve_link(href, base_url) {
                links.push(absolute);
            }
        }
    }

    links
}

/// Generic matcher: every anchor whose resolved URL has the product shape
pub fn url_shape_links(html: &Html, base_url: &Url, shape: &ProductUrlShape) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in html.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute) = resolve_link(href, base_url) {
                if shape.matches(&absolute) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

/// Reads the next-page control, if the page has one
///
/// Absence is the normal end-of-catalog signal, not an error.
pub fn next_page_url(html: &Html, base_url: &Url, next_selector: &Selector) -> Option<String> {
    html.select(next_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
