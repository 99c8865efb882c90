//! Product extractor - source fallback and reconciliation
//!
//! Runs the extraction sources strictly in trust order and accepts the
//! first one yielding at least one valid offer. Lower-priority sources are
//! never consulted for price/marketplace once a source has been accepted;
//! there is no field-level merging across sources. The one cross-source
//! touch is the seller-name enrichment pass, which only fills empty fields.

use crate::extract::dom;
use crate::extract::embedded;
use crate::extract::listing::{
    assign_ranks, validate_candidate, OfferError, ProductListing, SellerOffer,
};
use crate::extract::structured;
use crate::extract::{ExtractionSource, LoadedPage};
use crate::FailureKind;

/// Result of one extraction run over a loaded page
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Retained offers, ranked; all from `accepted_source`
    pub offers: Vec<SellerOffer>,

    /// The source that produced the offers, when any did
    pub accepted_source: Option<ExtractionSource>,

    /// Every candidate discarded along the way, per source
    pub rejected: Vec<(ExtractionSource, OfferError)>,
}

impl ExtractionOutcome {
    /// True when no source yielded a valid offer
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Reconciles the page-embedded offer sources into one seller list
pub struct ProductExtractor {
    currency_marker: String,
}

impl ProductExtractor {
    /// Creates an extractor with the configured currency marker
    pub fn new(currency_marker: impl Into<String>) -> Self {
        Self {
            currency_marker: currency_marker.into(),
        }
    }

    /// Extracts the seller list from a loaded page
    pub fn extract(&self, page: &LoadedPage) -> ExtractionOutcome {
        let mut rejected = Vec::new();

        for source in ExtractionSource::in_priority_order() {
            let candidates = match source {
                ExtractionSource::StructuredData => structured::offer_candidates(&page.html),
                ExtractionSource::EmbeddedVariable => match &page.embedded_payload {
                    Some(payload) => embedded::offer_candidates(payload),
                    None => Vec::new(),
                },
                ExtractionSource::DomHeuristic => dom::offer_candidates(&page.html),
            };

            let mut offers = Vec::new();
            for (position, candidate) in candidates.into_iter().enumerate() {
                let result = candidate.and_then(|c| {
                    validate_candidate(position, c, source, &self.currency_marker)
                });
                match result {
                    Ok(offer) => offers.push(offer),
                    Err(e) => {
                        tracing::debug!("{}: discarded {}", source, e);
                        rejected.push((source, e));
                    }
                }
            }

            if offers.is_empty() {
                tracing::debug!("{}: no valid offers, falling through", source);
                continue;
            }

            assign_ranks(&mut offers, source);

            if offers.iter().any(|o| o.seller_name.is_empty()) {
                dom::enrich_seller_names(&mut offers, &page.rendered_text);
            }

            tracing::info!(
                "Accepted {} offer(s) from {} for {}",
                offers.len(),
                source,
                page.url
            );

            return ExtractionOutcome {
                offers,
                accepted_source: Some(source),
                rejected,
            };
        }

        tracing::warn!("No extraction source yielded offers for {}", page.url);
        ExtractionOutcome {
            offers: Vec::new(),
            accepted_source: None,
            rejected,
        }
    }

    /// Applies an outcome to a listing and finalizes its aggregates
    pub fn apply(&self, listing: &mut ProductListing, outcome: ExtractionOutcome) {
        if outcome.is_empty() {
            listing.mark_failed(FailureKind::ExtractionEmpty);
            return;
        }

        listing.finalize_sellers(outcome.offers, &self.currency_marker);
    }
}
