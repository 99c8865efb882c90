//! Chromium-backed driver using chromiumoxide
//!
//! The browser profile (cookies included) lives in an on-disk directory that
//! survives across runs, so a one-time manual challenge resolution is
//! remembered by subsequent runs of the same host process. The profile
//! directory is an exclusive resource: two live sessions must never share one.

use crate::browser::driver::{DriverError, DriverResult, PageDriver};
use crate::config::BrowserConfig as BrowserSettings;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

/// Finds the Chrome/Chromium binary path
///
/// Checks the explicit configuration first, then the system PATH.
pub fn find_chromium(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(p) = configured {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    None
}

/// A Chromium session driving one page
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    page_timeout: Duration,
}

impl ChromiumDriver {
    /// Launches Chromium with the persistent profile directory and opens
    /// the single page this driver will operate on
    pub async fn launch(
        settings: &BrowserSettings,
        page_timeout: Duration,
    ) -> DriverResult<Self> {
        let chrome_path = find_chromium(settings.chrome_binary.as_deref()).ok_or_else(|| {
            DriverError::Launch(
                "Chrome/Chromium binary not found; set browser.chrome-binary".to_string(),
            )
        })?;

        std::fs::create_dir_all(&settings.profile_dir)
            .map_err(|e| DriverError::Launch(format!("cannot create profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&settings.profile_dir)
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-background-networking");

        if !settings.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| DriverError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        // Drain CDP events for the lifetime of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            page_timeout,
        })
    }

    /// Closes the page and the browser process
    pub async fn shutdown(mut self) {
        let _ = self.page.close().await;
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
    }

    /// Decides whether a failed call means the whole session is gone
    ///
    /// A trivial script probe still succeeding means the failure was local
    /// to the original call; a dead probe means the CDP connection is lost.
    async fn classify_failure(&mut self, fallback: DriverError) -> DriverError {
        match self.page.evaluate("1 + 1").await {
            Ok(_) => fallback,
            Err(e) => DriverError::Disconnected(e.to_string()),
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let result = tokio::time::timeout(self.page_timeout, self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => {
                let fallback = DriverError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                };
                Err(self.classify_failure(fallback).await)
            }
            Err(_) => Err(DriverError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    async fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let result = match self.page.evaluate(script).await {
            Ok(r) => r,
            Err(e) => {
                let fallback = DriverError::Script(e.to_string());
                return Err(self.classify_failure(fallback).await);
            }
        };

        result
            .into_value()
            .map_err(|e| DriverError::Script(format!("failed to convert script result: {e:?}")))
    }

    async fn title(&mut self) -> DriverResult<String> {
        let value = self.execute_script("document.title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        let value = self
            .execute_script("document.documentElement.outerHTML")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
