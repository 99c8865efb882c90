//! Configuration module for Offer-Lens
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, including the site-specific extraction knobs and their defaults.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, OutputConfig, SiteConfig, TargetsConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
