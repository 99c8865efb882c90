//! DOM-heuristic extraction source and seller-name enrichment
//!
//! Least authoritative source: pattern matching over rendered listing rows.
//! Used as the last fallback for whole offers, and - independently of which
//! source was accepted - for the rank-positional enrichment that fills
//! missing sub-seller names from `"/SellerName"` tokens in rendered text.

use crate::extract::listing::{OfferCandidate, OfferError, SellerOffer, FREE_SHIPPING_BADGE};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Tokens that disqualify a seller-name candidate. Short tokens must match
/// the whole candidate; longer ones disqualify on substring match.
const SELLER_NOISE_TOKENS: &[&str] = &[
    "tl",
    "₺",
    "kargo",
    "ücretsiz",
    "bedava",
    "fiyat",
    "stok",
    "stokta",
    "tükendi",
    "bugün",
    "yarın",
    "sepet",
    "kampanya",
    "free shipping",
    "in stock",
    "price",
];

/// Bounds on a plausible seller name, in characters
const SELLER_NAME_MIN: usize = 2;
const SELLER_NAME_MAX: usize = 49;

/// Converts rendered listing rows into offer candidates
///
/// A row qualifies when it carries a price with the currency marker; the
/// marketplace is read from the row's logo alt text or its leading token.
pub fn offer_candidates(html: &str) -> Vec<Result<OfferCandidate, OfferError>> {
    let document = Html::parse_document(html);
    let row_selector = match Selector::parse("li, tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let img_selector = Selector::parse("img[alt]").ok();
    let link_selector = Selector::parse("a[href]").ok();

    let price_re = match Regex::new(r"(\d[\d.,]*)\s*(?:TL|₺)") {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for row in document.select(&row_selector) {
        let text = row.text().collect::<Vec<_>>().join(" ");
        let price_text = match price_re.captures(&text) {
            Some(caps) => caps[1].to_string(),
            None => continue,
        };

        let marketplace = img_selector
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .and_then(|img| img.value().attr("alt"))
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| leading_token(&text));

        // Nested containers repeat the same row; keep the first sighting
        if !seen.insert((marketplace.clone(), price_text.clone())) {
            continue;
        }

        let product_link = link_selector
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        let lowered = text.to_lowercase();
        let mut badges = Vec::new();
        if lowered.contains("ücretsiz kargo")
            || lowered.contains("kargo bedava")
            || lowered.contains("free shipping")
        {
            badges.push(FREE_SHIPPING_BADGE.to_string());
        }

        let in_stock = !lowered.contains("tükendi") && !lowered.contains("stokta yok");

        let seller_name = seller_name_candidates(&text)
            .into_iter()
            .next()
            .unwrap_or_default();

        results.push(Ok(OfferCandidate {
            marketplace,
            seller_name,
            price_text,
            product_link,
            badges,
            in_stock,
        }));
    }

    results
}

/// First whitespace token with at least two letters, or empty
fn leading_token(text: &str) -> String {
    text.split_whitespace()
        .find(|token| token.chars().filter(|c| c.is_alphabetic()).count() >= 2)
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .unwrap_or_default()
}

/// Scans rendered text for `"/SellerName"` tokens, in document order
///
/// Candidates are validated against the noise denylist and the length
/// bound before they are returned.
pub fn seller_name_candidates(rendered_text: &str) -> Vec<String> {
    let re = match Regex::new(r"/([^\s/]{1,60})") {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };

    re.captures_iter(rendered_text)
        .map(|caps| {
            caps[1]
                .trim()
                .trim_end_matches(&[',', ';', ')', ']'][..])
                .to_string()
        })
        .filter(|candidate| is_plausible_seller_name(candidate))
        .collect()
}

/// Validates one seller-name candidate
fn is_plausible_seller_name(candidate: &str) -> bool {
    let char_count = candidate.chars().count();
    if !(SELLER_NAME_MIN..=SELLER_NAME_MAX).contains(&char_count) {
        return false;
    }

    // Needs a letter; bare numbers and separators are noise
    if !candidate.chars().any(|c| c.is_alphabetic()) {
        return false;
    }

    // Time-of-day strings and URL/domain fragments
    if candidate.contains(':') || candidate.contains('.') {
        return false;
    }

    let lowered = candidate.to_lowercase();
    for token in SELLER_NOISE_TOKENS {
        if token.len() <= 3 {
            if lowered == *token {
                return false;
            }
        } else if lowered.contains(token) {
            return false;
        }
    }

    true
}

/// Fills empty `seller_name` fields rank-positionally from rendered text
///
/// The i-th validated candidate maps onto the i-th offer. Offers whose
/// `seller_name` is already set are left untouched, which makes repeated
/// application a no-op.
pub fn enrich_seller_names(offers: &mut [SellerOffer], rendered_text: &str) {
    if offers.iter().all(|o| !o.seller_name.is_empty()) {
        return;
    }

    let candidates = seller_name_candidates(rendered_text);
    if candidates.is_empty() {
        return;
    }

    let mut filled = 0usize;
    for (offer, candidate) in offers.iter_mut().zip(candidates.iter()) {
        if offer.seller_name.is_empty() {
            offer.seller_name = candidate.clone();
            filled += 1;
        }
    }

    if filled > 0 {
        tracing::debug!("Enrichment filled {} seller name(s)", filled);
    }
}
