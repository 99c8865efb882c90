use serde::Deserialize;

/// Main configuration structure for Offer-Lens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub targets: TargetsConfig,
    pub output: OutputConfig,
}

/// Crawler pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum navigation attempts per product page
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Page-load timeout (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Interval between challenge-state polls (milliseconds)
    #[serde(rename = "challenge-poll-interval-ms")]
    pub challenge_poll_interval_ms: u64,

    /// Hard wall-clock ceiling for waiting out a challenge (seconds)
    #[serde(rename = "challenge-wait-ceiling-secs")]
    pub challenge_wait_ceiling_secs: u64,

    /// Lower bound of the randomized pre-navigation delay (milliseconds)
    #[serde(rename = "pre-nav-delay-min-ms")]
    pub pre_nav_delay_min_ms: u64,

    /// Upper bound of the randomized pre-navigation delay (milliseconds)
    #[serde(rename = "pre-nav-delay-max-ms")]
    pub pre_nav_delay_max_ms: u64,

    /// Lower bound of the randomized delay between batch items (milliseconds)
    #[serde(rename = "item-delay-min-ms")]
    pub item_delay_min_ms: u64,

    /// Upper bound of the randomized delay between batch items (milliseconds)
    #[serde(rename = "item-delay-max-ms")]
    pub item_delay_max_ms: u64,

    /// Extra cooldown after a blocked item (seconds)
    #[serde(rename = "blocked-cooldown-secs")]
    pub blocked_cooldown_secs: u64,

    /// Safety ceiling on listing pages visited per category
    #[serde(rename = "max-category-pages")]
    pub max_category_pages: u32,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Directory holding the persistent browser profile (cookies included).
    /// Must not be shared by concurrently running batches.
    #[serde(rename = "profile-dir")]
    pub profile_dir: String,

    /// Run the browser headless
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit path to the Chrome/Chromium binary (auto-detected if unset)
    #[serde(rename = "chrome-binary")]
    pub chrome_binary: Option<String>,
}

fn default_headless() -> bool {
    true
}

/// Site-specific extraction knobs
///
/// The defaults target the marketplace family this tool was built for;
/// every knob can be overridden per deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Regex a product-detail URL must match; capture group 1 is the product id
    #[serde(rename = "product-url-pattern", default = "default_product_url_pattern")]
    pub product_url_pattern: String,

    /// Title substrings that indicate an anti-automation challenge
    #[serde(rename = "challenge-title-markers", default = "default_title_markers")]
    pub challenge_title_markers: Vec<String>,

    /// Page-source substrings that indicate an anti-automation challenge
    #[serde(rename = "challenge-content-markers", default = "default_content_markers")]
    pub challenge_content_markers: Vec<String>,

    /// Script-scoped globals probed for the embedded offer payload, in order
    #[serde(rename = "embedded-globals", default = "default_embedded_globals")]
    pub embedded_globals: Vec<String>,

    /// Selector for the next-page control on listing pages
    #[serde(rename = "next-page-selector", default = "default_next_page_selector")]
    pub next_page_selector: String,

    /// Selector for product-card anchors on listing pages
    #[serde(rename = "product-card-selector", default = "default_product_card_selector")]
    pub product_card_selector: String,

    /// Currency marker appended to formatted prices
    #[serde(rename = "currency-marker", default = "default_currency_marker")]
    pub currency_marker: String,
}

fn default_product_url_pattern() -> String {
    r",(\d+)\.html$".to_string()
}

fn default_title_markers() -> Vec<String> {
    vec![
        "Bir dakika".to_string(),
        "Just a moment".to_string(),
        "Erişim engellendi".to_string(),
        "Access denied".to_string(),
    ]
}

fn default_content_markers() -> Vec<String> {
    vec![
        "cf-challenge".to_string(),
        "cf-turnstile".to_string(),
        "challenge-platform".to_string(),
    ]
}

fn default_embedded_globals() -> Vec<String> {
    vec!["__OFFER_DATA__".to_string(), "offerData".to_string()]
}

fn default_next_page_selector() -> String {
    "a[rel='next'], a.next".to_string()
}

fn default_product_card_selector() -> String {
    "li[data-pr] a[href], div.product-card a[href]".to_string()
}

fn default_currency_marker() -> String {
    "TL".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            product_url_pattern: default_product_url_pattern(),
            challenge_title_markers: default_title_markers(),
            challenge_content_markers: default_content_markers(),
            embedded_globals: default_embedded_globals(),
            next_page_selector: default_next_page_selector(),
            product_card_selector: default_product_card_selector(),
            currency_marker: default_currency_marker(),
        }
    }
}

/// Crawl targets
#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    /// Category listing URLs to discover product URLs from
    #[serde(default)]
    pub categories: Vec<String>,

    /// Product-detail URLs to crawl directly
    #[serde(default)]
    pub products: Vec<String>,

    /// Upper bound on products crawled in one batch run
    #[serde(rename = "max-products")]
    pub max_products: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path the JSON results report is written to
    #[serde(rename = "results-path")]
    pub results_path: String,
}
