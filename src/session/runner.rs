//! Batch runner - sequential crawl loop with pacing and cancellation
//!
//! One navigation+extraction cycle per target, in input order. The loop
//! sleeps a randomized duration between items, extends the pause after a
//! blocked item, checks the session's stop flag at item boundaries only,
//! and removes the session registry entry on every exit path.

use crate::browser::{DriverError, PageDriver};
use crate::config::{CrawlerConfig, SiteConfig, TargetsConfig};
use crate::discovery::{CategoryCrawler, DiscoveryError, ProductUrlShape};
use crate::extract::{read_identity, LoadedPage, ProductExtractor, ProductListing};
use crate::navigation::NavigationController;
use crate::session::progress::{percent_of, ProgressSink, ProgressUpdate, Severity};
use crate::session::store::{SessionGuard, SessionStore};
use crate::FailureKind;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a batch run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every target was processed
    Completed,

    /// A cooperative stop was observed; results are a prefix of the input
    Cancelled,

    /// The browser became unusable; results are whatever completed before
    Aborted,
}

/// Results of a batch run
#[derive(Debug)]
pub struct BatchReport {
    /// Listings in input target order
    pub listings: Vec<ProductListing>,

    /// How the run ended
    pub status: BatchStatus,

    /// Present when `status` is `Aborted`
    pub abort_reason: Option<String>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl BatchReport {
    /// Count of listings without an error message
    pub fn success_count(&self) -> usize {
        self.listings.iter().filter(|l| l.is_success()).count()
    }

    /// Count of listings carrying an error message
    pub fn error_count(&self) -> usize {
        self.listings.len() - self.success_count()
    }
}

/// Orchestrates one batch run over a browser session
pub struct BatchRunner<D> {
    controller: NavigationController<D>,
    extractor: ProductExtractor,
    store: Arc<SessionStore>,
    sink: Arc<dyn ProgressSink>,
    crawler_config: CrawlerConfig,
    site: SiteConfig,
    shape: ProductUrlShape,
}

impl<D: PageDriver> BatchRunner<D> {
    /// Creates a runner over an already-built navigation controller
    pub fn new(
        controller: NavigationController<D>,
        store: Arc<SessionStore>,
        sink: Arc<dyn ProgressSink>,
        crawler_config: CrawlerConfig,
        site: SiteConfig,
    ) -> crate::Result<Self> {
        let shape = ProductUrlShape::new(&site.product_url_pattern)?;
        let extractor = ProductExtractor::new(site.currency_marker.clone());

        Ok(Self {
            controller,
            extractor,
            store,
            sink,
            crawler_config,
            site,
            shape,
        })
    }

    /// Consumes the runner, returning the controller (and with it the driver)
    pub fn into_controller(self) -> NavigationController<D> {
        self.controller
    }

    /// Resolves the configured targets into the product URL list to crawl
    ///
    /// Categories are discovered first (once per run), then direct product
    /// targets are appended; the union is deduplicated in first-seen order
    /// and capped at `max-products`. A blocked category is reported and
    /// skipped; it never fails the run.
    pub async fn discover_targets(
        &mut self,
        targets: &TargetsConfig,
    ) -> crate::Result<Vec<String>> {
        let max_products = targets.max_products as usize;
        let mut urls: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for category in &targets.categories {
            if urls.len() >= max_products {
                break;
            }

            self.sink.report(ProgressUpdate::new(
                0,
                format!("Discovering products in {category}"),
                Severity::Info,
            ));

            let remaining = max_products - urls.len();
            let mut crawler =
                CategoryCrawler::new(&mut self.controller, &self.site, &self.crawler_config)?;

            match crawler.discover(category, remaining).await {
                Ok(found) => {
                    let before = urls.len();
                    for url in found {
                        if seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                    self.sink.report(ProgressUpdate::new(
                        0,
                        format!("Found {} product URL(s) in {category}", urls.len() - before),
                        Severity::Info,
                    ));
                }
                Err(DiscoveryError::Blocked { url }) => {
                    self.sink.report(ProgressUpdate::new(
                        0,
                        format!("Category blocked, skipping: {url}"),
                        Severity::Warning,
                    ));
                }
                Err(DiscoveryError::InvalidUrl(url)) => {
                    self.sink.report(ProgressUpdate::new(
                        0,
                        format!("Invalid category URL, skipping: {url}"),
                        Severity::Warning,
                    ));
                }
                Err(DiscoveryError::Driver(e)) => return Err(e.into()),
            }
        }

        for product in &targets.products {
            if urls.len() >= max_products {
                break;
            }
            if seen.insert(product.clone()) {
                urls.push(product.clone());
            }
        }

        Ok(urls)
    }

    /// Runs one batch over `targets` under the given session id
    ///
    /// The only `Err` paths are registration conflicts and configuration
    /// problems; everything that happens during the run - including a
    /// dead browser - is reported in the returned [`BatchReport`] with
    /// whatever partial results exist.
    pub async fn run_batch(
        &mut self,
        targets: &[String],
        session_id: &str,
    ) -> crate::Result<BatchReport> {
        self.store.register(session_id)?;
        let _guard = SessionGuard::new(Arc::clone(&self.store), session_id);

        tracing::info!(
            "Batch '{}' started with {} target(s)",
            session_id,
            targets.len()
        );

        let started = Instant::now();
        let total = targets.len();
        let mut listings = Vec::new();
        let mut status = BatchStatus::Completed;
        let mut abort_reason = None;

        for (index, target) in targets.iter().enumerate() {
            if self.store.is_stop_requested(session_id) {
                tracing::info!("Stop observed for '{}'; returning partial results", session_id);
                self.sink.report(ProgressUpdate::new(
                    percent_of(index, total),
                    format!("Stopped after {index} of {total} item(s)"),
                    Severity::Warning,
                ));
                status = BatchStatus::Cancelled;
                break;
            }

            if index > 0 {
                tokio::time::sleep(self.item_delay()).await;
            }

            let (listing, failure) = match self.process_item(target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Browser unusable, aborting batch '{}': {}", session_id, e);
                    self.sink.report(ProgressUpdate::new(
                        percent_of(index, total),
                        format!("Batch aborted: {e}"),
                        Severity::Error,
                    ));
                    status = BatchStatus::Aborted;
                    abort_reason = Some(e.to_string());
                    break;
                }
            };

            let done = index + 1;
            let update = match &listing.error_message {
                None => ProgressUpdate::new(
                    percent_of(done, total),
                    format!(
                        "{} ({}/{}): {} seller(s)",
                        listing.name, done, total,
                        listing.sellers.len()
                    ),
                    Severity::Success,
                ),
                Some(message) => ProgressUpdate::new(
                    percent_of(done, total),
                    format!("{target} ({done}/{total}): {message}"),
                    Severity::Warning,
                ),
            };
            self.sink.report(update);
            listings.push(listing);

            if failure == Some(FailureKind::NavigationBlocked) {
                let cooldown = Duration::from_secs(self.crawler_config.blocked_cooldown_secs);
                if !cooldown.is_zero() {
                    tracing::info!("Cooling down {:?} after a blocked item", cooldown);
                    tokio::time::sleep(cooldown).await;
                }
            }
        }

        let report = BatchReport {
            listings,
            status,
            abort_reason,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Batch '{}' finished: {} ok, {} failed, status {:?} in {:?}",
            session_id,
            report.success_count(),
            report.error_count(),
            report.status,
            report.elapsed
        );

        Ok(report)
    }

    /// One navigation+extraction cycle
    ///
    /// `Err` only for batch-fatal driver failures; per-item failures are
    /// recorded on the listing.
    async fn process_item(
        &mut self,
        target: &str,
    ) -> Result<(ProductListing, Option<FailureKind>), DriverError> {
        let product = match self.shape.parse(target) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Skipping malformed target {}: {}", target, e);
                let mut listing = ProductListing::scheduled(String::new(), target);
                listing.mark_failed(FailureKind::MalformedUrl);
                return Ok((listing, Some(FailureKind::MalformedUrl)));
            }
        };

        let mut listing = ProductListing::scheduled(product.id.clone(), product.url.clone());

        let nav = self
            .controller
            .navigate_with_retry(&product.url, self.crawler_config.max_retries)
            .await?;

        if !nav.success {
            let kind = nav.failure.unwrap_or(FailureKind::NavigationBlocked);
            listing.mark_failed(kind);
            return Ok((listing, Some(kind)));
        }

        let page = match LoadedPage::capture(
            self.controller.driver_mut(),
            &product.url,
            &self.site.embedded_globals,
        )
        .await
        {
            Ok(page) => page,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Could not snapshot {}: {}", product.url, e);
                listing.mark_failed(FailureKind::ExtractionEmpty);
                return Ok((listing, Some(FailureKind::ExtractionEmpty)));
            }
        };

        let identity = read_identity(&page);
        listing.name = identity.name;
        listing.image_url = identity.image_url;

        let outcome = self.extractor.extract(&page);
        let failure = outcome.is_empty().then_some(FailureKind::ExtractionEmpty);
        self.extractor.apply(&mut listing, outcome);

        Ok((listing, failure))
    }

    /// Randomized inter-item delay
    fn item_delay(&self) -> Duration {
        let min = self.crawler_config.item_delay_min_ms;
        let max = self.crawler_config.item_delay_max_ms;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}
