//! Progress reporting
//!
//! A side channel only: batch results never travel through it. The runner
//! emits one update per processed item plus discovery milestones; the
//! consuming UI/CLI layer decides what to do with them.

use serde::Serialize;

/// Severity of a progress update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One progress tuple
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Completion percentage, 0-100
    pub percent: u8,

    /// Human-readable status line
    pub message: String,

    /// Severity for display purposes
    pub severity: Severity,
}

impl ProgressUpdate {
    /// Creates an update, clamping the percentage to 0-100
    pub fn new(percent: u8, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
            severity,
        }
    }
}

/// Rounded completion percentage for `done` of `total` items
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (done * 100 + total / 2) / total;
    percent.min(100) as u8
}

/// Consumer of progress updates
///
/// Implementations must be thread-safe; the runner calls them from the
/// crawl loop while a stop handler may be poking the session store from
/// another thread.
pub trait ProgressSink: Send + Sync {
    /// Receives one progress update
    fn report(&self, update: ProgressUpdate);
}

/// Sink that forwards updates to the tracing log
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&self, update: ProgressUpdate) {
        match update.severity {
            Severity::Info | Severity::Success => {
                tracing::info!("[{:>3}%] {}", update.percent, update.message)
            }
            Severity::Warning => {
                tracing::warn!("[{:>3}%] {}", update.percent, update.message)
            }
            Severity::Error => {
                tracing::error!("[{:>3}%] {}", update.percent, update.message)
            }
        }
    }
}
