//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product crawler.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config, StageConfig};
use catalog_harvest::crawler::run_stages;
use catalog_harvest::output::{load_statistics, print_run_report, print_statistics, RunInfo};
use catalog_harvest::progress::LogProgress;
use catalog_harvest::render::ChromiumLauncher;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a staged product catalog crawler
///
/// Collects category pages from a shop's index, paginates every category to
/// record product page URLs, then extracts a structured record from each
/// product page. Every stage writes a file checkpoint the next one reads.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A staged product catalog crawler", long_about = None)]
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

    /// Validate config and show what would run without launching a browser
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the checkpoint files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Run only the named stage; repeat to run several (overrides [stages])
    #[arg(long = "stage", value_enum, value_name = "STAGE")]
    stages: Vec<Stage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    Diagnostics,
    CollectBaseUrls,
    CollectEndpoints,
    ProcessProducts,
}

/// Resolves which stages run: `--stage` flags win over the config file
fn selected_stages(config: &StageConfig, requested: &[Stage]) -> StageConfig {
    if requested.is_empty() {
        return config.clone();
    }
    StageConfig {
        diagnostics: requested.contains(&Stage::Diagnostics),
        collect_base_urls: requested.contains(&Stage::CollectBaseUrls),
        collect_endpoints: requested.contains(&Stage::CollectEndpoints),
        process_products: requested.contains(&Stage::ProcessProducts),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let stages = selected_stages(&config.stages, &cli.stages);

    if cli.dry_run {
        handle_dry_run(&config, &stages);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_run(&config, &stages, config_hash).await;
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
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, stages: &StageConfig) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Index URL: {}", config.site.index_url);
    println!("  Link base: {}", config.site.link_base);

    println!("\nStages:");
    let flag = |on: bool| if on { "enabled" } else { "disabled" };
    println!("  diagnostics: {}", flag(stages.diagnostics));
    println!("  collect-base-urls: {}", flag(stages.collect_base_urls));
    println!("  collect-endpoints: {}", flag(stages.collect_endpoints));
    println!("  process-products: {}", flag(stages.process_products));

    println!("\nCrawler:");
    println!("  Max retries per category: {}", config.crawler.max_retries);
    println!("  Product concurrency: {}", config.crawler.concurrency);

    println!("\nTimeouts (ms):");
    let t = &config.timeouts;
    for (name, range) in [
        ("index navigation", t.index_navigation),
        ("index content", t.index_content),
        ("category navigation", t.category_navigation),
        ("category grid", t.category_grid),
        ("product navigation", t.product_navigation),
        ("product content", t.product_content),
        ("consent", t.consent),
        ("overlay", t.overlay),
    ] {
        println!("  {}: {}-{}", name, range.min, range.max);
    }

    println!("\nCheckpoints:");
    println!("  Base URLs: {}", config.paths.base_urls_file.display());
    println!("  Endpoints: {}", config.paths.endpoints_dir.display());
    println!("  Products: {}", config.paths.products_file.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes the checkpoint files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let stats = load_statistics(config).context("Failed to read checkpoint files")?;
    print_statistics(&stats);
    Ok(())
}

/// Runs the selected stages and prints the run report
async fn handle_run(config: &Config, stages: &StageConfig, config_hash: String) {
    let launcher = ChromiumLauncher::new(config.browser.clone());
    let progress = LogProgress::new();

    let started_at = Utc::now();
    let report = run_stages(config, stages, &launcher, &progress).await;
    let info = RunInfo {
        started_at,
        finished_at: Utc::now(),
        config_hash,
    };

    if report.failures.is_empty() {
        tracing::info!("Run completed");
    } else {
        tracing::warn!("Run completed with {} failed stage(s)", report.failures.len());
    }
    print_run_report(&report, &info);
}
