//! Extraction module - multi-source offer extraction and reconciliation
//!
//! A loaded product page embeds seller/price data in up to three
//! partially-overlapping places. Each one is modeled as an
//! [`ExtractionSource`] with a single canonical conversion function, and the
//! extractor runs them strictly in trust order, accepting the first source
//! that yields at least one valid offer.

mod dom;
mod embedded;
mod extractor;
mod listing;
mod price;
mod structured;

pub use dom::{enrich_seller_names, seller_name_candidates};
pub use extractor::{ExtractionOutcome, ProductExtractor};
pub use listing::{
    assign_ranks, validate_candidate, OfferCandidate, OfferError, ProductListing, SellerOffer,
    CHEAPEST_BADGE, FREE_SHIPPING_BADGE,
};
pub use price::{format_price, parse_price, price_from_json};

use crate::browser::{DriverResult, PageDriver};
use serde::Serialize;

/// Where a seller offer came from, ordered by trust (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionSource {
    /// Machine-readable embedded metadata (ld+json)
    StructuredData,

    /// Page-global script-scoped offer payload
    EmbeddedVariable,

    /// Rendered-text/DOM pattern matching; least authoritative
    DomHeuristic,
}

impl ExtractionSource {
    /// All sources in the order they are tried
    pub fn in_priority_order() -> [Self; 3] {
        [
            Self::StructuredData,
            Self::EmbeddedVariable,
            Self::DomHeuristic,
        ]
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::StructuredData => "structured-data",
            Self::EmbeddedVariable => "embedded-variable",
            Self::DomHeuristic => "dom-heuristic",
        }
    }
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of a loaded product page
///
/// Assembled once per page from the driver; extraction itself is pure and
/// synchronous over this snapshot.
#[derive(Debug, Clone, Default)]
pub struct LoadedPage {
    pub url: String,
    pub title: String,
    pub html: String,
    pub rendered_text: String,
    pub embedded_payload: Option<serde_json::Value>,
}

impl LoadedPage {
    /// Captures a snapshot of the page the driver currently has loaded
    ///
    /// `embedded_globals` are probed in order; the first global holding a
    /// non-null value becomes the embedded payload.
    pub async fn capture<D: PageDriver>(
        driver: &mut D,
        url: &str,
        embedded_globals: &[String],
    ) -> DriverResult<Self> {
        let title = driver.title().await?;
        let html = driver.page_source().await?;

        let rendered_text = driver
            .execute_script("document.body ? document.body.innerText : ''")
            .await
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .unwrap_or_default();

        let mut embedded_payload = None;
        for global in embedded_globals {
            let script = format!(
                "JSON.stringify(window['{global}'] === undefined ? null : window['{global}'])"
            );
            let value = match driver.execute_script(&script).await {
                Ok(v) => v,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!("Embedded global probe '{}' failed: {}", global, e);
                    continue;
                }
            };

            if let Some(json_text) = value.as_str() {
                match serde_json::from_str::<serde_json::Value>(json_text) {
                    Ok(serde_json::Value::Null) => {}
                    Ok(parsed) => {
                        tracing::debug!("Embedded payload found in global '{}'", global);
                        embedded_payload = Some(parsed);
                        break;
                    }
                    Err(e) => {
                        tracing::debug!("Embedded global '{}' held unparsable JSON: {}", global, e)
                    }
                }
            }
        }

        Ok(Self {
            url: url.to_string(),
            title,
            html,
            rendered_text,
            embedded_payload,
        })
    }
}

/// Product name and image read from a loaded page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIdentity {
    pub name: String,
    pub image_url: String,
}

/// Reads the product's display identity from a loaded page
///
/// Prefers OpenGraph metadata, falling back to the document title.
pub fn read_identity(page: &LoadedPage) -> PageIdentity {
    let document = scraper::Html::parse_document(&page.html);

    let meta_content = |property: &str| -> Option<String> {
        let selector = scraper::Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    };

    let name = meta_content("og:title")
        .or_else(|| {
            let selector = scraper::Selector::parse("title").ok()?;
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| page.title.clone());

    let image_url = meta_content("og:image").unwrap_or_default();

    PageIdentity { name, image_url }
}
