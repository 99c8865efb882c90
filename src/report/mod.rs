//! Report module - the produced side of the crate
//!
//! Listings are handed to a [`ListingSink`]; what happens to them after
//! that (spreadsheets, images, dashboards) belongs to external consumers.
//! The crate ships one JSON file sink for the CLI.

mod json;
mod traits;

pub use json::JsonFileSink;
pub use traits::{ListingSink, ReportError, ReportResult};
