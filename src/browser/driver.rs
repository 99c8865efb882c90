//! Browser driver seam
//!
//! The crawler never talks to a browser directly; it goes through the
//! [`PageDriver`] trait. One implementation wraps a real Chromium session,
//! and tests substitute a scripted driver. A driver owns exactly one page
//! and is used sequentially (see the session module for why).

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a browser driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Page load timed out for {url}")]
    Timeout { url: String },

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser session is no longer usable: {0}")]
    Disconnected(String),
}

impl DriverError {
    /// Returns true if the browser process is unusable and the batch run
    /// cannot continue. Everything else is retryable per item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::Disconnected(_))
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A driven browser page
///
/// Methods take `&mut self`: a page carries session state (cookies, the
/// active document) that is not safe for interleaved use.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates the page to an absolute URL and waits for the load to settle
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Executes a script in the page and returns its JSON-serialized result
    async fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value>;

    /// Reads the current document title
    async fn title(&mut self) -> DriverResult<String>;

    /// Reads the current document source
    async fn page_source(&mut self) -> DriverResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_is_fatal() {
        assert!(DriverError::Launch("no binary".to_string()).is_fatal());
    }

    #[test]
    fn test_disconnected_is_fatal() {
        assert!(DriverError::Disconnected("socket closed".to_string()).is_fatal());
    }

    #[test]
    fn test_timeout_is_not_fatal() {
        let err = DriverError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_navigation_is_not_fatal() {
        let err = DriverError::Navigation {
            url: "https://example.com".to_string(),
            message: "net::ERR_FAILED".to_string(),
        };
        assert!(!err.is_fatal());
    }
}
