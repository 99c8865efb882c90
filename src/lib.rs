//! Offer-Lens: a marketplace offer harvester for gated listing sites
//!
//! This crate crawls e-commerce listing pages that sit behind an
//! anti-automation gate, discovers product URLs, and reconciles seller/price
//! data from the independent data sources embedded in each product page.

pub mod browser;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod navigation;
pub mod report;
pub mod session;

use thiserror::Error;

/// Main error type for Offer-Lens operations
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser driver error: {0}")]
    Driver(#[from] browser::DriverError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] discovery::DiscoveryError),

    #[error("Product URL error: {0}")]
    ProductUrl(#[from] ProductUrlError),

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("Session '{0}' is already registered")]
    SessionExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Errors for target URLs that do not match the product-detail shape
#[derive(Debug, Error)]
pub enum ProductUrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL does not match the product-detail shape: {0}")]
    NotProductShaped(String),
}

/// Terminal classification of a failed crawl item
///
/// Every per-item failure resolves to one of these. None of them abort a
/// batch run; the only batch-fatal condition is an unusable browser, which
/// travels as [`browser::DriverError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The anti-automation challenge never cleared within the retry budget
    NavigationBlocked,

    /// No extraction source yielded a valid offer
    ExtractionEmpty,

    /// The target URL does not match the expected product-detail shape
    MalformedUrl,

    /// A cooperative stop was observed before this item started
    Cancelled,
}

impl FailureKind {
    /// Human-readable message recorded on the listing
    pub fn message(&self) -> &'static str {
        match self {
            Self::NavigationBlocked => "Navigation blocked by challenge",
            Self::ExtractionEmpty => "No sellers extracted",
            Self::MalformedUrl => "Target URL is not a product page",
            Self::Cancelled => "Cancelled before processing",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result type alias for Offer-Lens operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{DriverError, PageDriver};
pub use config::Config;
pub use extract::{ExtractionSource, ProductListing, SellerOffer};
pub use navigation::{ChallengeState, NavigationResult};
pub use session::{BatchReport, BatchStatus, SessionStore};
