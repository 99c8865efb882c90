//! Offer-Lens main entry point
//!
//! Command-line interface for the Offer-Lens marketplace offer harvester.

use clap::Parser;
use offer_lens::browser::ChromiumDriver;
use offer_lens::config::load_config_with_hash;
use offer_lens::discovery::CategoryCrawler;
use offer_lens::extract::ProductListing;
use offer_lens::navigation::{ChallengeProbe, NavigationController, RetryPolicy};
use offer_lens::report::{JsonFileSink, ListingSink};
use offer_lens::session::{BatchRunner, LogSink, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Offer-Lens: a marketplace offer harvester for gated listing sites
///
/// Offer-Lens crawls product listings that sit behind an anti-automation
/// gate, discovers product URLs from category pages, and reconciles
/// seller/price data from the data sources embedded in each page.
#[derive(Parser, Debug)]
#[command(name = "offer-lens")]
#[command(version = "1.0.0")]
#[command(about = "A marketplace offer harvester for gated listing sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "discover")]
    dry_run: bool,

    /// Discover product URLs from one category page and exit
    #[arg(long, value_name = "URL")]
    discover: Option<String>,

    /// Session id for this run (generated when omitted)
    #[arg(long, value_name = "ID")]
    session_id: Option<String>,

    /// Discard the persisted browser profile before launching
    #[arg(long)]
    fresh_profile: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.fresh_profile {
        tracing::info!("Discarding browser profile at {}", config.browser.profile_dir);
        let _ = std::fs::remove_dir_all(&config.browser.profile_dir);
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if let Some(category_url) = cli.discover.as_deref() {
        handle_discover(&config, category_url).await?;
    } else {
        handle_crawl(&config, cli.session_id).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("offer_lens=info,warn"),
            1 => EnvFilter::new("offer_lens=debug,info"),
            2 => EnvFilter::new("offer_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &offer_lens::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Offer-Lens Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!(
        "  Challenge wait: poll {}ms, ceiling {}s",
        config.crawler.challenge_poll_interval_ms, config.crawler.challenge_wait_ceiling_secs
    );
    println!(
        "  Item delay: {}-{}ms, blocked cooldown {}s",
        config.crawler.item_delay_min_ms,
        config.crawler.item_delay_max_ms,
        config.crawler.blocked_cooldown_secs
    );

    println!("\nBrowser:");
    println!("  Profile dir: {}", config.browser.profile_dir);
    println!("  Headless: {}", config.browser.headless);

    println!("\nSite:");
    println!("  Product URL pattern: {}", config.site.product_url_pattern);
    println!(
        "  Challenge markers: {} title, {} content",
        config.site.challenge_title_markers.len(),
        config.site.challenge_content_markers.len()
    );
    println!("  Currency marker: {}", config.site.currency_marker);

    println!("\nTargets:");
    println!("  Categories ({}):", config.targets.categories.len());
    for category in &config.targets.categories {
        println!("    - {}", category);
    }
    println!("  Products ({}):", config.targets.products.len());
    for product in &config.targets.products {
        println!("    - {}", product);
    }
    println!("  Max products: {}", config.targets.max_products);

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --discover mode: collects product URLs from one category
async fn handle_discover(
    config: &offer_lens::config::Config,
    category_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = build_controller(config).await?;

    let mut crawler = CategoryCrawler::new(&mut controller, &config.site, &config.crawler)?;
    let urls = crawler
        .discover(category_url, config.targets.max_products as usize)
        .await?;

    println!("Discovered {} product URL(s):", urls.len());
    for url in &urls {
        println!("{}", url);
    }

    controller.into_driver().shutdown().await;
    Ok(())
}

/// Handles the main batch crawl
async fn handle_crawl(
    config: &offer_lens::config::Config,
    session_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session_id = session_id.unwrap_or_else(|| {
        format!("batch-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
    });
    tracing::info!("Session id: {}", session_id);

    let store = Arc::new(SessionStore::new());

    // Ctrl-C requests a cooperative stop; the run ends at the next item
    // boundary with partial results.
    {
        let store = Arc::clone(&store);
        let session_id = session_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current item");
                store.request_stop(&session_id);
            }
        });
    }

    let controller = build_controller(config).await?;
    let mut runner = BatchRunner::new(
        controller,
        Arc::clone(&store),
        Arc::new(LogSink),
        config.crawler.clone(),
        config.site.clone(),
    )?;

    let targets = runner.discover_targets(&config.targets).await?;
    if targets.is_empty() {
        tracing::warn!("No crawlable product URLs resolved from the configured targets");
    }
    tracing::info!("Crawling {} product URL(s)", targets.len());

    let report = runner.run_batch(&targets, &session_id).await?;

    let sink = JsonFileSink::new(&config.output.results_path);
    sink.write_batch(&report.listings)?;
    sink.finalize(&report)?;

    print_summary(&report.listings);

    runner.into_controller().into_driver().shutdown().await;
    Ok(())
}

/// Builds the browser driver and navigation controller from configuration
async fn build_controller(
    config: &offer_lens::config::Config,
) -> Result<NavigationController<ChromiumDriver>, Box<dyn std::error::Error>> {
    let driver = ChromiumDriver::launch(
        &config.browser,
        Duration::from_secs(config.crawler.page_timeout_secs),
    )
    .await?;

    let policy = RetryPolicy::from_config(&config.crawler);
    let probe = ChallengeProbe::from_site(&config.site);
    Ok(NavigationController::new(driver, policy, probe))
}

/// Prints a human-readable batch summary to stdout
fn print_summary(listings: &[ProductListing]) {
    let ok = listings.iter().filter(|l| l.is_success()).count();
    println!("\n{} listing(s), {} ok, {} failed", listings.len(), ok, listings.len() - ok);

    for listing in listings {
        match &listing.error_message {
            None => println!(
                "  ✓ {} - {} seller(s), from {}",
                listing.name,
                listing.sellers.len(),
                listing.lowest_price
            ),
            Some(message) => println!("  ✗ {} - {}", listing.url, message),
        }
    }
}
