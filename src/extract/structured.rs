//! Structured-data extraction source (ld+json)
//!
//! The most trusted source: machine-readable product metadata embedded in
//! `<script type="application/ld+json">` blocks. Handles a bare Product
//! object, a top-level array, and `@graph` wrappers; offers may appear as
//! a single offer, an offer array, or an AggregateOffer holding one.

use crate::extract::listing::{OfferCandidate, OfferError};
use scraper::{Html, Selector};
use serde_json::Value;

/// Converts the page's structured data into offer candidates
///
/// One entry per offer object found; malformed entries surface as errors
/// instead of being dropped.
pub fn offer_candidates(html: &str) -> Vec<Result<OfferCandidate, OfferError>> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();

    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Skipping unparsable ld+json block: {}", e);
                continue;
            }
        };

        for product in find_products(&parsed) {
            for (position, offer) in collect_offers(product).into_iter().enumerate() {
                results.push(convert_offer(position, offer));
            }
        }
    }

    results
}

/// Finds Product objects in a parsed ld+json value
fn find_products(value: &Value) -> Vec<&Value> {
    let mut products = Vec::new();

    match value {
        Value::Array(items) => {
            for item in items {
                products.extend(find_products(item));
            }
        }
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("Product") {
                products.push(value);
            } else if let Some(graph) = map.get("@graph") {
                products.extend(find_products(graph));
            }
        }
        _ => {}
    }

    products
}

/// Collects the individual offer objects under a Product
fn collect_offers(product: &Value) -> Vec<&Value> {
    let offers = match product.get("offers") {
        Some(o) => o,
        None => return Vec::new(),
    };

    match offers {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            // AggregateOffer wraps the per-seller offers
            if let Some(Value::Array(items)) = map.get("offers") {
                items.iter().collect()
            } else {
                vec![offers]
            }
        }
        _ => Vec::new(),
    }
}

/// Canonical conversion of one ld+json offer object into a candidate
fn convert_offer(position: usize, offer: &Value) -> Result<OfferCandidate, OfferError> {
    let map = offer.as_object().ok_or_else(|| OfferError::MalformedEntry {
        position,
        message: "offer entry is not an object".to_string(),
    })?;

    let price_text = map
        .get("price")
        .or_else(|| map.get("priceSpecification").and_then(|s| s.get("price")))
        .map(json_to_text)
        .unwrap_or_default();

    let marketplace = map
        .get("seller")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let product_link = map
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let in_stock = map
        .get("availability")
        .and_then(Value::as_str)
        .map(|a| a.contains("InStock"))
        .unwrap_or(true);

    Ok(OfferCandidate {
        marketplace,
        // ld+json carries no sub-seller identity; enrichment fills this later
        seller_name: String::new(),
        price_text,
        product_link,
        badges: Vec::new(),
        in_stock,
    })
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_ldjson(json: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">{json}</script></head><body></body></html>"#
        )
    }

    #[test]
    fn test_aggregate_offer_with_sellers() {
        let html = page_with_ldjson(
            r#"{
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Telefon",
                "offers": {
                    "@type": "AggregateOffer",
                    "lowPrice": "54999.00",
                    "offers": [
                        {"@type": "Offer", "price": "54999.00", "seller": {"name": "Pttavm"}, "url": "https://pttavm.example/p/1", "availability": "https://schema.org/InStock"},
                        {"@type": "Offer", "price": "56100.00", "seller": {"name": "GittiGidiyor"}}
                    ]
                }
            }"#,
        );

        let results = offer_candidates(&html);
        assert_eq!(results.len(), 2);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.marketplace, "Pttavm");
        assert_eq!(first.price_text, "54999.00");
        assert_eq!(first.product_link, "https://pttavm.example/p/1");
        assert!(first.in_stock);
        assert!(first.seller_name.is_empty());
    }

    #[test]
    fn test_single_offer_object() {
        let html = page_with_ldjson(
            r#"{"@type": "Product", "offers": {"@type": "Offer", "price": 149.9, "seller": {"name": "Trendyol"}}}"#,
        );

        let results = offer_candidates(&html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().price_text, "149.9");
    }

    #[test]
    fn test_graph_wrapper() {
        let html = page_with_ldjson(
            r#"{"@graph": [{"@type": "Product", "offers": [{"price": "10", "seller": {"name": "A"}}]}]}"#,
        );

        let results = offer_candidates(&html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().marketplace, "A");
    }

    #[test]
    fn test_out_of_stock_availability() {
        let html = page_with_ldjson(
            r#"{"@type": "Product", "offers": [{"price": "10", "seller": {"name": "A"}, "availability": "https://schema.org/OutOfStock"}]}"#,
        );

        let results = offer_candidates(&html);
        assert!(!results[0].as_ref().unwrap().in_stock);
    }

    #[test]
    fn test_malformed_offer_entry_reported() {
        let html = page_with_ldjson(
            r#"{"@type": "Product", "offers": ["not-an-object", {"price": "10", "seller": {"name": "A"}}]}"#,
        );

        let results = offer_candidates(&html);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(OfferError::MalformedEntry { position: 0, .. })
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_no_structured_data() {
        let results = offer_candidates("<html><body><p>nothing here</p></body></html>");
        assert!(results.is_empty());
    }

    #[test]
    fn test_unparsable_json_skipped() {
        let html = page_with_ldjson("{{{ not json");
        let results = offer_candidates(&html);
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_seller_yields_empty_marketplace() {
        // Validation downstream discards these; conversion itself keeps them
        let html = page_with_ldjson(r#"{"@type": "Product", "offers": [{"price": "10"}]}"#);
        let results = offer_candidates(&html);
        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap().marketplace.is_empty());
    }

    #[test]
    fn test_price_specification_fallback() {
        let html = page_with_ldjson(
            r#"{"@type": "Product", "offers": [{"priceSpecification": {"price": 42.5}, "seller": {"name": "B"}}]}"#,
        );
        let results = offer_candidates(&html);
        assert_eq!(results[0].as_ref().unwrap().price_text, "42.5");
    }
}
