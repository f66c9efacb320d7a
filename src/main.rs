//! Directory-Harvest main entry point
//!
//! This is the command-line interface for the business-directory harvester.

use anyhow::Context;
use clap::Parser;
use directory_harvest::config::{load_config_with_hash, Config};
use directory_harvest::crawler::{discover_regions, CrawlOrchestrator, RateLimitedFetcher, SelectorExtractor};
use directory_harvest::output::{load_statistics, print_statistics};
use directory_harvest::state::{CheckpointStore, CompletedRegions};
use directory_harvest::storage::SqliteDocumentStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Directory-Harvest: an incremental business-directory harvester
///
/// Walks paginated directory listings region by region, classifies each
/// company into an industry and loads it into a document store. Completed
/// regions are checkpointed, so an interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "directory-harvest")]
#[command(version)]
#[command(about = "An incremental business-directory harvester", long_about = None)]
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

    /// Forget completed regions and walk every region again
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with_all = ["stats", "discover_regions"])]
    dry_run: bool,

    /// Show document counts and region progress and exit
    #[arg(long, conflicts_with_all = ["dry_run", "discover_regions"])]
    stats: bool,

    /// Rebuild the region work list from the configured directory page and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    discover_regions: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let checkpoints = CheckpointStore::new(&config.files.regions, &config.files.completed_regions);

    let result = if cli.dry_run {
        handle_dry_run(&config, &checkpoints)
    } else if cli.stats {
        handle_stats(&config, &checkpoints)
    } else if cli.discover_regions {
        handle_discover_regions(&config, &checkpoints).await
    } else {
        handle_harvest(&config, &checkpoints, cli.fresh).await
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("directory_harvest=info,warn"),
            1 => EnvFilter::new("directory_harvest=debug,info"),
            2 => EnvFilter::new("directory_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the configuration and the regions still to walk
fn handle_dry_run(config: &Config, checkpoints: &CheckpointStore) -> anyhow::Result<()> {
    println!("=== Directory-Harvest Dry Run ===\n");

    println!("Fetcher:");
    println!(
        "  Delay per domain: {}ms to {}ms",
        config.fetcher.base_delay_ms, config.fetcher.max_delay_ms
    );
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    if config.fetcher.user_agents.is_empty() {
        println!("  User agents: built-in pool");
    } else {
        println!("  User agents: {} configured", config.fetcher.user_agents.len());
    }
    println!(
        "  Pause between pages: {}ms to {}ms",
        config.crawler.min_pause_ms, config.crawler.max_pause_ms
    );

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path.display());
    println!(
        "  Collections: {}, {}, {}",
        config.store.company_collection,
        config.store.location_collection,
        config.store.industry_collection
    );
    println!(
        "  Flush every {} records or {}s",
        config.store.buffer_size, config.store.max_wait_secs
    );

    println!("\nFiles:");
    println!("  Regions: {}", config.files.regions.display());
    println!("  Completed: {}", config.files.completed_regions.display());
    println!("  Keywords: {}", config.files.keyword_table.display());
    if let Some(states) = &config.files.region_states {
        println!("  Region states: {}", states.display());
    }

    let regions = checkpoints
        .load_regions()
        .context("Failed to load region work list")?;
    let completed = checkpoints
        .load_completed()
        .context("Failed to load completed regions")?;
    let pending: Vec<_> = regions
        .iter()
        .filter(|r| !completed.contains(&r.region_name))
        .collect();

    println!("\nPending Regions ({} of {}):", pending.len(), regions.len());
    for region in &pending {
        println!("  - {} ({})", region.region_name, region.entry_url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows document counts and region progress
fn handle_stats(config: &Config, checkpoints: &CheckpointStore) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path.display());

    let store = SqliteDocumentStore::open(&config.store.database_path)
        .context("Failed to open document store")?;

    let collections = [
        config.store.company_collection.as_str(),
        config.store.location_collection.as_str(),
        config.store.industry_collection.as_str(),
    ];
    let stats = load_statistics(&store, &collections, checkpoints)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --discover-regions mode: rebuilds the region work list
async fn handle_discover_regions(config: &Config, checkpoints: &CheckpointStore) -> anyhow::Result<()> {
    let discovery = config
        .discovery
        .as_ref()
        .context("--discover-regions needs a [discovery] section in the configuration")?;

    let mut fetcher = RateLimitedFetcher::new(&config.fetcher)?;
    let regions = discover_regions(&mut fetcher, discovery, checkpoints).await?;

    println!(
        "✓ Wrote {} regions to {}",
        regions.len(),
        checkpoints.regions_path().display()
    );
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, checkpoints: &CheckpointStore, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        checkpoints.persist_completed(&CompletedRegions::new())?;
        tracing::info!(
            "Starting fresh harvest (cleared completed regions in {})",
            checkpoints.completed_path().display()
        );
    } else {
        tracing::info!("Starting harvest (completed regions are skipped)");
    }

    let extractor = SelectorExtractor::from_config(&config.extractor)?;
    let store = SqliteDocumentStore::open(&config.store.database_path)
        .context("Failed to open document store")?;
    let store = Arc::new(Mutex::new(store));

    let orchestrator = CrawlOrchestrator::from_config(config, store, extractor)?;
    let summary = orchestrator.harvest().await?;

    tracing::info!(
        "Harvest completed: {} regions walked, {} companies added",
        summary.regions_completed,
        summary.records_added
    );
    Ok(())
}
