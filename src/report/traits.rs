//! Listing sink trait and report errors

use crate::extract::ProductListing;
use crate::session::BatchReport;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Consumer of finished listings
///
/// Implementations receive listings that are final: aggregates computed,
/// never mutated again. Export formatting beyond the field semantics is
/// the implementation's business.
pub trait ListingSink {
    /// Writes one finished batch of listings
    fn write_batch(&self, listings: &[ProductListing]) -> ReportResult<()>;

    /// Called once with the batch report after the run ends
    fn finalize(&self, report: &BatchReport) -> ReportResult<()>;
}
