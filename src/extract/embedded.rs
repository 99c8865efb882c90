//! Embedded-variable extraction source
//!
//! Second in trust order: a page-global, script-scoped payload exposing the
//! offer list. The payload never identifies sub-sellers, so `seller_name`
//! is left empty for the enrichment pass. Key names vary across page
//! revisions; the conversion probes the known spellings.

use crate::extract::listing::{OfferCandidate, OfferError};
use serde_json::Value;

const MARKETPLACE_KEYS: &[&str] = &["marketplace", "mp", "merchant", "store"];
const PRICE_KEYS: &[&str] = &["price", "p", "amount", "value"];
const LINK_KEYS: &[&str] = &["link", "url", "l"];
const STOCK_KEYS: &[&str] = &["inStock", "in_stock", "stock"];

/// Converts the embedded payload into offer candidates
pub fn offer_candidates(payload: &Value) -> Vec<Result<OfferCandidate, OfferError>> {
    let entries = match payload {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        Value::Object(map) => {
            // Payload may nest the list under a known key
            match map
                .get("offers")
                .or_else(|| map.get("list"))
                .or_else(|| map.get("items"))
            {
                Some(Value::Array(items)) => items.iter().collect(),
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| convert_entry(position, entry))
        .collect()
}

/// Canonical conversion of one payload entry into a candidate
fn convert_entry(position: usize, entry: &Value) -> Result<OfferCandidate, OfferError> {
    // A bare number is a price with no marketplace; it is kept so the
    // missing marketplace is reported downstream rather than silently lost.
    if let Value::Number(n) = entry {
        return Ok(OfferCandidate {
            price_text: n.to_string(),
            in_stock: true,
            ..OfferCandidate::default()
        });
    }

    let map = entry.as_object().ok_or_else(|| OfferError::MalformedEntry {
        position,
        message: "payload entry is neither object nor number".to_string(),
    })?;

    let marketplace = first_string(map, MARKETPLACE_KEYS).unwrap_or_default();
    let price_text = first_text(map, PRICE_KEYS).unwrap_or_default();
    let product_link = first_string(map, LINK_KEYS).unwrap_or_default();

    let in_stock = STOCK_KEYS
        .iter()
        .find_map(|k| map.get(*k))
        .map(|v| match v {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_i64().unwrap_or(0) > 0,
            _ => true,
        })
        .unwrap_or(true);

    Ok(OfferCandidate {
        marketplace,
        seller_name: String::new(),
        price_text,
        product_link,
        badges: Vec::new(),
        in_stock,
    })
}

fn first_string(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn first_text(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k)).map(|v| match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
