//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest listing extractor.

use anyhow::Context;
use clap::Parser;
use listing_harvest::config::{load_config_with_hash, Config};
use listing_harvest::input::load_requests;
use listing_harvest::output::{print_statistics, write_output};
use listing_harvest::record::ScrapeRequest;
use listing_harvest::routing::SiteKind;
use listing_harvest::Harvester;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: marketplace listing extractor
///
/// Reads a list of listing URLs, scrapes each one with the extractor of the
/// site it belongs to and writes one CSV row per input URL, in input order.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Extracts marketplace listings into one CSV table", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Input CSV/XLSX file (overrides `[input] path`)
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Directory for the output CSV (overrides `[output] directory`)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input and show the per-site grouping without scraping
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let input_path = cli
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.input.path));
    let requests = load_requests(&input_path)
        .with_context(|| format!("failed to load input {}", input_path.display()))?;

    if cli.dry_run {
        handle_dry_run(config, &requests);
        return Ok(());
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    handle_harvest(config, &requests, output_dir).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows how the input would be dispatched
fn handle_dry_run(config: Config, requests: &[ScrapeRequest]) {
    println!("=== Listing-Harvest Dry Run ===\n");

    println!("Fetch:");
    println!("  Bootstrap URL: {}", config.fetch.bootstrap_url);
    println!("  Request delay: {}ms", config.fetch.request_delay_ms);
    println!(
        "  Retry: {} attempt(s), backoff {}..{}ms",
        config.retry.max_attempts, config.retry.min_backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nBrowser:");
    println!("  WebDriver: {}", config.browser.webdriver_url);
    println!("  Headless: {}", config.browser.headless);

    println!("\nRouting ({} entries):", config.sites.len());
    for binding in &config.sites {
        println!("  - {} → {}", binding.domain, binding.site_name);
    }

    let harvester = Harvester::new(config);
    let groups = harvester.plan(requests);

    println!("\nSite Groups:");
    for group in &groups {
        let extractor = match SiteKind::from_site_name(&group.site_name) {
            Some(SiteKind::Auction) => "static markup",
            Some(SiteKind::Marketplace) => "rendered markup",
            None => "no extractor, partial records",
        };
        println!(
            "  - {} ({} URL(s), {})",
            group.site_name,
            group.requests.len(),
            extractor
        );
        for request in &group.requests {
            println!("    * [{}] {}", request.original_index, request.url);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} URL(s)", requests.len());
}

/// Handles the main harvest: scrape, write the CSV, print statistics
async fn handle_harvest(
    config: Config,
    requests: &[ScrapeRequest],
    output_dir: PathBuf,
) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} URL(s) across {} routing entries",
        requests.len(),
        config.sites.len()
    );

    let harvester = Harvester::new(config);
    let report = harvester.run_with_statistics(requests).await;

    let path = write_output(&output_dir, report.records)
        .with_context(|| format!("failed to write output to {}", output_dir.display()))?;

    print_statistics(&report.statistics);
    println!("\n✓ Output written to: {}", path.display());

    Ok(())
}
