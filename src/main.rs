//! Event-Sweep main entry point
//!
//! This is the command-line interface for the Event-Sweep crawler.

use anyhow::{bail, Context};
use clap::Parser;
use event_sweep::config::{load_config_with_hash, validate, Config};
use event_sweep::crawler::{generate_work_units, HtmlCategoryScraper, Orchestrator};
use event_sweep::delivery::{DeliveryPolicy, HttpSink};
use event_sweep::output::print_report;
use event_sweep::server::{serve, AppState};
use event_sweep::storage::replay_failed_batches;
use event_sweep::url::build_category_url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Event-Sweep: an events-listing crawler with reliable batch delivery
///
/// Event-Sweep walks every location / category / subcategory combination,
/// scrapes the listed events and posts them in batches to a callback URL.
#[derive(Parser, Debug)]
#[command(name = "event-sweep")]
#[command(version)]
#[command(about = "Crawls event listings and delivers them to a callback", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run the HTTP trigger instead of a single crawl
    #[arg(long, conflicts_with_all = ["dry_run", "replay"])]
    serve: bool,

    /// Listing site root, e.g. https://www.district.in/events
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// URL receiving each batch as a JSON array
    #[arg(long, value_name = "URL")]
    callback_url: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["serve", "replay"])]
    dry_run: bool,

    /// Redeliver persisted failed batches to --callback-url and exit
    #[arg(long, conflicts_with_all = ["serve", "dry_run"])]
    replay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&config, cli.base_url.as_deref());
    } else if cli.serve {
        handle_serve(config).await?;
    } else if cli.replay {
        let Some(callback_url) = cli.callback_url.as_deref() else {
            bail!("--replay requires --callback-url");
        };
        handle_replay(&config, callback_url).await?;
    } else {
        let (Some(base_url), Some(callback_url)) =
            (cli.base_url.as_deref(), cli.callback_url.as_deref())
        else {
            bail!("a crawl requires --base-url and --callback-url (or use --serve)");
        };
        handle_crawl(config, base_url, callback_url).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("event_sweep=info,warn"),
            1 => EnvFilter::new("event_sweep=debug,info"),
            2 => EnvFilter::new("event_sweep=trace,debug"),
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

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, base_url: Option<&str>) {
    let units = generate_work_units(&config.locations, &config.categories);

    println!("=== Event-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.max_events {
        Some(cap) => println!("  Max events: {}", cap),
        None => println!("  Max events: unlimited"),
    }
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Cooldown: {}ms", config.crawler.cooldown_ms);

    println!("\nDelivery:");
    println!("  Attempts per batch: {}", config.delivery.max_retries);
    println!("  Attempt timeout: {}ms", config.delivery.timeout_ms);
    println!(
        "  Backoff: {}ms per attempt, capped at {}ms",
        config.delivery.backoff_base_ms, config.delivery.backoff_cap_ms
    );

    if config.persistence.enabled {
        println!("\nFailed batches are persisted to: {}", config.persistence.directory);
    }

    println!("\nLocations ({}):", config.locations.len());
    for location in &config.locations {
        println!("  - {}", location);
    }

    println!(
        "\nSubcategories: {} activities, {} events",
        config.categories.activities.len(),
        config.categories.events.len()
    );

    if let Some(base_url) = base_url {
        println!("\nWork units:");
        for unit in &units {
            println!(
                "  {} -> {}",
                unit,
                build_category_url(base_url, &unit.location, &unit.sub_category)
            );
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} work units", units.len());
}

/// Handles the --serve mode: runs the HTTP trigger
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    let scraper = HtmlCategoryScraper::new(config.scraper.clone());
    let orchestrator = Orchestrator::new(config, scraper)?;

    serve(&bind, AppState::new(Arc::new(orchestrator))).await?;
    Ok(())
}

/// Handles the --replay mode: redelivers persisted batches
async fn handle_replay(config: &Config, callback_url: &str) -> anyhow::Result<()> {
    let policy = DeliveryPolicy::from(&config.delivery);
    let sink = HttpSink::new(callback_url, policy.timeout_per_attempt)?;
    let dir = Path::new(&config.persistence.directory);

    let summary = replay_failed_batches(dir, &sink, &policy).await?;

    println!(
        "✓ Replayed {} batches ({} events), {} still failing",
        summary.delivered_batches, summary.delivered_events, summary.failed_batches
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, base_url: &str, callback_url: &str) -> anyhow::Result<()> {
    match event_sweep::crawler::crawl(config, base_url, callback_url).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
