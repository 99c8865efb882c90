//! JSON file sink

use crate::extract::ProductListing;
use crate::report::traits::{ListingSink, ReportResult};
use crate::session::BatchReport;
use std::path::PathBuf;

/// Writes listings as pretty-printed JSON to a configured path
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured output path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ListingSink for JsonFileSink {
    fn write_batch(&self, listings: &[ProductListing]) -> ReportResult<()> {
        let json = serde_json::to_string_pretty(listings)?;
        std::fs::write(&self.path, json)?;
        tracing::info!("Wrote {} listing(s) to {}", listings.len(), self.path.display());
        Ok(())
    }

    fn finalize(&self, report: &BatchReport) -> ReportResult<()> {
        tracing::info!(
            "Run summary: {} ok, {} failed, status {:?}, {:.1}s",
            report.success_count(),
            report.error_count(),
            report.status,
            report.elapsed.as_secs_f64()
        );
        Ok(())
    }
}
