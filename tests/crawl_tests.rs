//! Integration tests for the batch crawl cycle
//!
//! These tests drive the full discover -> navigate -> extract -> report
//! pipeline end-to-end over a scripted page driver, with pacing knobs
//! near zero.

use async_trait::async_trait;
use offer_lens::browser::{DriverResult, PageDriver};
use offer_lens::config::{CrawlerConfig, SiteConfig, TargetsConfig};
use offer_lens::navigation::{ChallengeProbe, NavigationController, RetryPolicy};
use offer_lens::report::{JsonFileSink, ListingSink};
use offer_lens::session::{BatchRunner, BatchStatus, ProgressSink, ProgressUpdate, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One scripted page
#[derive(Clone, Default)]
struct PageSpec {
    title: String,
    html: String,
    rendered_text: String,
    embedded_json: Option<String>,
    /// Number of initial reads that present the challenge page instead
    challenged_reads: usize,
}

/// Driver serving scripted pages keyed by URL
struct ScriptedDriver {
    pages: HashMap<String, PageSpec>,
    reads: HashMap<String, usize>,
    current: String,
}

impl ScriptedDriver {
    fn new(pages: Vec<(&str, PageSpec)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, spec)| (url.to_string(), spec))
                .collect(),
            reads: HashMap::new(),
            current: String::new(),
        }
    }

    fn current_spec(&self) -> PageSpec {
        self.pages.get(&self.current).cloned().unwrap_or_default()
    }

    fn challenged(&self) -> bool {
        let spec = self.current_spec();
        let reads = self.reads.get(&self.current).copied().unwrap_or(0);
        reads < spec.challenged_reads
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.current = url.to_string();
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let spec = self.current_spec();
        if script.contains("innerText") {
            return Ok(serde_json::Value::String(spec.rendered_text));
        }
        if script.contains("JSON.stringify") {
            let payload = spec.embedded_json.unwrap_or_else(|| "null".to_string());
            return Ok(serde_json::Value::String(payload));
        }
        Ok(serde_json::Value::Null)
    }

    async fn title(&mut self) -> DriverResult<String> {
        if self.challenged() {
            return Ok("Bir dakika...".to_string());
        }
        Ok(self.current_spec().title)
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        let challenged = self.challenged();
        *self.reads.entry(self.current.clone()).or_insert(0) += 1;
        if challenged {
            return Ok("<html><body>challenge</body></html>".to_string());
        }
        Ok(self.current_spec().html)
    }
}

#[derive(Default)]
struct RecordingSink {
    updates: std::sync::Mutex<Vec<ProgressUpdate>>,
}

impl ProgressSink for RecordingSink {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn create_test_config() -> CrawlerConfig {
    CrawlerConfig {
        max_retries: 2,
        page_timeout_secs: 5,
        challenge_poll_interval_ms: 1,
        challenge_wait_ceiling_secs: 1,
        pre_nav_delay_min_ms: 0,
        pre_nav_delay_max_ms: 0,
        item_delay_min_ms: 0,
        item_delay_max_ms: 0,
        blocked_cooldown_secs: 0,
        max_category_pages: 5,
    }
}

fn create_runner(
    driver: ScriptedDriver,
    store: Arc<SessionStore>,
    sink: Arc<RecordingSink>,
) -> BatchRunner<ScriptedDriver> {
    let site = SiteConfig::default();
    let policy = RetryPolicy {
        max_attempts: 2,
        base_delay_min: Duration::ZERO,
        base_delay_max: Duration::ZERO,
        poll_interval: Duration::from_millis(1),
        poll_ceiling: Duration::from_millis(100),
    };
    let probe = ChallengeProbe::from_site(&site);
    let controller = NavigationController::new(driver, policy, probe);
    BatchRunner::new(controller, store, sink, create_test_config(), site).unwrap()
}

fn structured_product_page() -> PageSpec {
    PageSpec {
        title: "Apple iPhone 15 Fiyatları".to_string(),
        html: r#"<html><head>
            <meta property="og:title" content="Apple iPhone 15 128 GB">
            <meta property="og:image" content="https://cdn.example.com/iphone.jpg">
            <script type="application/ld+json">{
                "@type": "Product",
                "offers": {"@type": "AggregateOffer", "offers": [
                    {"price": "56100.00", "seller": {"name": "Hepsiburada"}},
                    {"price": "54999.00", "seller": {"name": "Pttavm"}, "url": "https://pttavm.example/p/1"}
                ]}
            }</script>
        </head><body></body></html>"#
            .to_string(),
        rendered_text: "Pttavm /CepHane 54.999,00 TL\nHepsiburada /TeknoDepo 56.100,00 TL"
            .to_string(),
        ..PageSpec::default()
    }
}

fn embedded_only_page() -> PageSpec {
    PageSpec {
        title: "Samsung Galaxy Fiyatları".to_string(),
        html: "<html><head><title>Samsung Galaxy</title></head><body></body></html>".to_string(),
        embedded_json: Some(
            r#"[{"mp": "Trendyol", "p": 42000.0}, {"mp": "N11", "p": 43500.0}]"#.to_string(),
        ),
        ..PageSpec::default()
    }
}

const CATEGORY: &str = "https://www.example.com/telefon/";

fn listing_page(product_urls: &[&str], next: Option<&str>) -> PageSpec {
    let mut html = String::from("<html><body><ul>");
    for url in product_urls {
        html.push_str(&format!(
            r#"<li><div class="product-card"><a href="{url}">item</a></div></li>"#
        ));
    }
    html.push_str("</ul>");
    if let Some(next_url) = next {
        html.push_str(&format!(r#"<a rel="next" href="{next_url}">Sonraki</a>"#));
    }
    html.push_str("</body></html>");

    PageSpec {
        title: "Telefonlar".to_string(),
        html,
        ..PageSpec::default()
    }
}

#[tokio::test]
async fn test_full_batch_over_discovered_catalog() {
    let phone_a = "https://www.example.com/telefon/apple-iphone-15,844815559.html";
    let phone_b = "https://www.example.com/telefon/samsung-galaxy,900100200.html";

    let driver = ScriptedDriver::new(vec![
        (CATEGORY, listing_page(&[phone_a, phone_b], None)),
        (phone_a, structured_product_page()),
        (phone_b, embedded_only_page()),
    ]);

    let store = Arc::new(SessionStore::new());
    let sink = Arc::new(RecordingSink::default());
    let mut runner = create_runner(driver, Arc::clone(&store), Arc::clone(&sink));

    let targets_config = TargetsConfig {
        categories: vec![CATEGORY.to_string()],
        products: vec![],
        max_products: 10,
    };

    let targets = runner.discover_targets(&targets_config).await.unwrap();
    assert_eq!(targets, vec![phone_a.to_string(), phone_b.to_string()]);

    let report = runner.run_batch(&targets, "it-batch-1").await.unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.listings.len(), 2);
    assert!(report.listings.iter().all(|l| l.is_success()));

    // First product: structured data, price-sorted, enriched sub-sellers
    let first = &report.listings[0];
    assert_eq!(first.id, "844815559");
    assert_eq!(first.name, "Apple iPhone 15 128 GB");
    assert_eq!(first.image_url, "https://cdn.example.com/iphone.jpg");
    assert_eq!(first.lowest_price, "54.999,00 TL");
    assert_eq!(first.highest_price, "56.100,00 TL");
    assert_eq!(first.sellers.len(), 2);
    assert_eq!(first.sellers[0].rank, 1);
    assert_eq!(first.sellers[0].marketplace, "Pttavm");
    assert_eq!(first.sellers[0].seller_name, "CepHane");
    assert!(first.sellers[0].badges.iter().any(|b| b == "cheapest"));
    assert_eq!(first.sellers[1].marketplace, "Hepsiburada");

    // Second product: fell back to the embedded payload
    let second = &report.listings[1];
    assert_eq!(second.id, "900100200");
    assert_eq!(second.sellers.len(), 2);
    assert_eq!(second.sellers[0].marketplace, "Trendyol");
    assert_eq!(second.lowest_price, "42.000,00 TL");

    // Registry cleaned up, every retained offer valid
    assert!(!store.contains("it-batch-1"));
    for listing in &report.listings {
        for offer in &listing.sellers {
            assert!(offer.price > rust_decimal::Decimal::ZERO);
            assert!(!offer.marketplace.trim().is_empty());
        }
        let ranks: Vec<u32> = listing.sellers.iter().map(|o| o.rank).collect();
        let expected: Vec<u32> = (1..=listing.sellers.len() as u32).collect();
        assert_eq!(ranks, expected);
    }
}

#[tokio::test]
async fn test_challenge_cleared_mid_batch() {
    let phone = "https://www.example.com/telefon/apple-iphone-15,844815559.html";

    // The product page presents the challenge for the first two reads,
    // then clears during the poll wait
    let mut page = structured_product_page();
    page.challenged_reads = 2;

    let driver = ScriptedDriver::new(vec![(phone, page)]);
    let store = Arc::new(SessionStore::new());
    let sink = Arc::new(RecordingSink::default());
    let mut runner = create_runner(driver, store, sink);

    let report = runner
        .run_batch(&[phone.to_string()], "it-batch-2")
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert!(report.listings[0].is_success());
    assert_eq!(report.listings[0].sellers.len(), 2);
}

#[tokio::test]
async fn test_permanently_blocked_item_does_not_sink_batch() {
    let blocked = "https://www.example.com/telefon/blocked,111.html";
    let fine = "https://www.example.com/telefon/fine,222.html";

    let mut gate = PageSpec::default();
    gate.challenged_reads = usize::MAX;

    let driver = ScriptedDriver::new(vec![(blocked, gate), (fine, structured_product_page())]);
    let store = Arc::new(SessionStore::new());
    let sink = Arc::new(RecordingSink::default());
    let mut runner = create_runner(driver, store, Arc::clone(&sink));

    let report = runner
        .run_batch(&[blocked.to_string(), fine.to_string()], "it-batch-3")
        .await
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.listings.len(), 2);
    assert_eq!(
        report.listings[0].error_message.as_deref(),
        Some("Navigation blocked by challenge")
    );
    assert!(report.listings[1].is_success());
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.error_count(), 1);
}

#[tokio::test]
async fn test_extraction_empty_recorded_on_listing() {
    let empty = "https://www.example.com/telefon/empty,333.html";
    let page = PageSpec {
        title: "Ürün".to_string(),
        html: "<html><body><p>Satıcı yok</p></body></html>".to_string(),
        ..PageSpec::default()
    };

    let driver = ScriptedDriver::new(vec![(empty, page)]);
    let store = Arc::new(SessionStore::new());
    let sink = Arc::new(RecordingSink::default());
    let mut runner = create_runner(driver, store, sink);

    let report = runner
        .run_batch(&[empty.to_string()], "it-batch-4")
        .await
        .unwrap();

    assert_eq!(
        report.listings[0].error_message.as_deref(),
        Some("No sellers extracted")
    );
}

#[tokio::test]
async fn test_report_written_to_disk() {
    let phone = "https://www.example.com/telefon/apple-iphone-15,844815559.html";
    let driver = ScriptedDriver::new(vec![(phone, structured_product_page())]);
    let store = Arc::new(SessionStore::new());
    let sink = Arc::new(RecordingSink::default());
    let mut runner = create_runner(driver, store, sink);

    let report = runner
        .run_batch(&[phone.to_string()], "it-batch-5")
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    let file_sink = JsonFileSink::new(&path);
    file_sink.write_batch(&report.listings).unwrap();
    file_sink.finalize(&report).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed[0]["id"], "844815559");
    assert_eq!(parsed[0]["lowestPrice"], "54.999,00 TL");
    assert_eq!(parsed[0]["sellers"][0]["marketplace"], "Pttavm");
    assert_eq!(parsed[0]["sellers"][0]["sellerName"], "CepHane");
    assert_eq!(parsed[0]["sellers"][0]["rank"], 1);
}
