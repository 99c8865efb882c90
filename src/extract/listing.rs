//! Seller offers and product listings
//!
//! This module owns the offer schema every extraction source converts into,
//! the per-offer validation rules, and rank/aggregate finalization. An
//! offer survives only with a positive price and a non-empty marketplace;
//! everything discarded is reported as an [`OfferError`] so validation
//! failures stay observable instead of silently vanishing from output.

use crate::extract::price::{format_price, parse_price};
use crate::extract::ExtractionSource;
use crate::FailureKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Badge carried by the rank-1 (lowest price) offer
pub const CHEAPEST_BADGE: &str = "cheapest";

/// Badge for offers advertising free shipping
pub const FREE_SHIPPING_BADGE: &str = "free-shipping";

/// One seller's price and terms within a marketplace listing
#[derive(Debug, Clone, Serialize)]
pub struct SellerOffer {
    /// Position within the listing, 1-based, contiguous
    pub rank: u32,

    /// Platform operating the listing; always non-empty
    pub marketplace: String,

    /// Sub-seller within the marketplace; empty means no sub-seller
    #[serde(rename = "sellerName")]
    pub seller_name: String,

    /// Numeric price, always positive
    pub price: Decimal,

    /// Price in the site display convention
    #[serde(rename = "priceFormatted")]
    pub price_formatted: String,

    /// Link to this seller's page for the product
    #[serde(rename = "productLink")]
    pub product_link: String,

    /// Display badges (cheapest, free shipping, ...)
    pub badges: Vec<String>,

    /// Whether the offer is currently in stock
    #[serde(rename = "inStock")]
    pub in_stock: bool,

    /// Which extraction source produced this offer
    pub source: ExtractionSource,
}

/// An offer as read from a page source, before validation
#[derive(Debug, Clone, Default)]
pub struct OfferCandidate {
    pub marketplace: String,
    pub seller_name: String,
    pub price_text: String,
    pub product_link: String,
    pub badges: Vec<String>,
    pub in_stock: bool,
}

impl OfferCandidate {
    /// Candidate with the fields every source fills
    pub fn new(marketplace: impl Into<String>, price_text: impl Into<String>) -> Self {
        Self {
            marketplace: marketplace.into(),
            price_text: price_text.into(),
            in_stock: true,
            ..Self::default()
        }
    }
}

/// Why an offer candidate was discarded
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OfferError {
    #[error("offer {position}: marketplace is empty")]
    MissingMarketplace { position: usize },

    #[error("offer {position}: price '{raw}' is not positive")]
    NonPositivePrice { position: usize, raw: String },

    #[error("offer {position}: price '{raw}' is not parsable")]
    UnparsablePrice { position: usize, raw: String },

    #[error("offer {position}: {message}")]
    MalformedEntry { position: usize, message: String },
}

/// Validates a candidate into a retained offer
///
/// The returned offer has rank 0; ranks are assigned over the whole
/// accepted set by [`assign_ranks`].
pub fn validate_candidate(
    position: usize,
    candidate: OfferCandidate,
    source: ExtractionSource,
    currency_marker: &str,
) -> Result<SellerOffer, OfferError> {
    let marketplace = candidate.marketplace.trim().to_string();
    if marketplace.is_empty() {
        return Err(OfferError::MissingMarketplace { position });
    }

    let price = parse_price(&candidate.price_text).ok_or_else(|| OfferError::UnparsablePrice {
        position,
        raw: candidate.price_text.clone(),
    })?;

    if price <= Decimal::ZERO {
        return Err(OfferError::NonPositivePrice {
            position,
            raw: candidate.price_text.clone(),
        });
    }

    Ok(SellerOffer {
        rank: 0,
        marketplace,
        seller_name: candidate.seller_name.trim().to_string(),
        price_formatted: format_price(price, currency_marker),
        price,
        product_link: candidate.product_link,
        badges: candidate.badges,
        in_stock: candidate.in_stock,
        source,
    })
}

/// Assigns contiguous 1-based ranks and the cheapest badge
///
/// Structured data is ordered by ascending price before ranking; the other
/// sources keep their page encounter order.
pub fn assign_ranks(offers: &mut Vec<SellerOffer>, source: ExtractionSource) {
    if source == ExtractionSource::StructuredData {
        offers.sort_by(|a, b| a.price.cmp(&b.price));
    }

    for (i, offer) in offers.iter_mut().enumerate() {
        offer.rank = (i + 1) as u32;
    }

    if let Some(first) = offers.first_mut() {
        if !first.badges.iter().any(|b| b == CHEAPEST_BADGE) {
            first.badges.insert(0, CHEAPEST_BADGE.to_string());
        }
    }
}

/// One product's reconciled listing
///
/// Created when a crawl target is scheduled; name/image are filled after
/// navigation, sellers by the extractor; aggregates finalized before the
/// listing reaches the report sink and never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub sellers: Vec<SellerOffer>,
    #[serde(rename = "lowestPrice")]
    pub lowest_price: String,
    #[serde(rename = "highestPrice")]
    pub highest_price: String,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(rename = "extractedAt")]
    pub extracted_at: DateTime<Utc>,
}

impl ProductListing {
    /// Empty listing for a scheduled crawl target
    pub fn scheduled(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            name: String::new(),
            image_url: String::new(),
            sellers: Vec::new(),
            lowest_price: String::new(),
            highest_price: String::new(),
            error_message: None,
            extracted_at: Utc::now(),
        }
    }

    /// A listing is successful exactly when it carries no error message
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    /// Records a terminal per-item failure
    pub fn mark_failed(&mut self, kind: FailureKind) {
        self.error_message = Some(kind.message().to_string());
    }

    /// Installs the accepted offers and computes the price aggregates
    pub fn finalize_sellers(&mut self, sellers: Vec<SellerOffer>, currency_marker: &str) {
        if let Some(min) = sellers.iter().map(|o| o.price).min() {
            self.lowest_price = format_price(min, currency_marker);
        }
        if let Some(max) = sellers.iter().map(|o| o.price).max() {
            self.highest_price = format_price(max, currency_marker);
        }
        self.sellers = sellers;
        self.extracted_at = Utc::now();
    }
}
