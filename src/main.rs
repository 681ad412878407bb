//! Listing Harvester main entry point
//!
//! This is the command-line interface for the classifieds listing harvester.

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use listing_harvester::catalog::{load_categories, print_categories, select_category};
use listing_harvester::config::{load_config_with_hash, Config};
use listing_harvester::crawler::{Coordinator, HarvestEvent, HarvestRequest};
use listing_harvester::output::print_summary;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Progress events buffered between the coordinator and the progress bar
const EVENT_BUFFER: usize = 100;

/// Listing Harvester: collect classifieds listings into a CSV file
///
/// Walks the pages of one category, skips listings already seen in the run,
/// optionally visits every listing's own page for extended fields, and
/// writes each accepted listing to `<output dir>/<category>.csv` as soon as
/// it is collected.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "Collect classifieds listings into a CSV file", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Category to harvest: list position, identifier, or exact title
    #[arg(long, value_name = "SELECTOR")]
    category: Option<String>,

    /// Number of listings to collect (defaults to harvest.default-count)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,

    /// Fetch each listing's detail page for the extended columns
    #[arg(long)]
    deep: bool,

    /// Print the category list and exit
    #[arg(long, conflicts_with = "category")]
    list_categories: bool,

    /// Discard the category cache and discover categories again
    #[arg(long)]
    refresh_categories: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;
    let coordinator = Coordinator::new(config).context("failed to set up the harvester")?;
    let config = coordinator.config();

    let cache_path = Path::new(&config.output.category_cache);
    if cli.refresh_categories && cache_path.exists() {
        tracing::info!("Removing category cache {}", cache_path.display());
        std::fs::remove_file(cache_path)
            .with_context(|| format!("failed to remove {}", cache_path.display()))?;
    }

    let categories = load_categories(cache_path, coordinator.fetcher(), &config.site)
        .await
        .context("failed to load categories")?;

    if categories.is_empty() {
        anyhow::bail!(
            "no categories available; delete {} to rediscover them",
            cache_path.display()
        );
    }

    if cli.list_categories {
        print_categories(&categories);
        return Ok(());
    }

    let Some(selector) = cli.category.as_deref() else {
        print_categories(&categories);
        anyhow::bail!("choose a category with --category <SELECTOR>");
    };

    let category = select_category(&categories, selector)?.clone();
    let target = match cli.count {
        Some(count) => usize::try_from(count).context("count is too large")?,
        None => config.harvest.default_count,
    };

    let request = HarvestRequest::new(category, target, cli.deep, &config.output.directory);

    let (coordinator, progress) = if cli.quiet {
        (coordinator, None)
    } else {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        (
            coordinator.with_events(event_tx),
            Some(tokio::spawn(render_progress(event_rx))),
        )
    };

    let result = coordinator.harvest(&request).await;

    // Closes the event channel so the progress task can finish
    drop(coordinator);
    if let Some(progress) = progress {
        let _ = progress.await;
    }

    match result {
        Ok(summary) => {
            tracing::info!("Harvest finished: {}", summary);
            if !cli.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e).with_context(|| {
                format!(
                    "harvest aborted; rows collected so far are in {}",
                    request.output_path.display()
                )
            })
        }
    }
}

/// Draws a progress bar sized to the target, advanced per accepted listing
async fn render_progress(mut events: mpsc::Receiver<HarvestEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = events.recv().await {
        match event {
            HarvestEvent::Started { category, target } => {
                let progress = ProgressBar::new(target as u64);
                progress.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                progress.set_message(category);
                bar = Some(progress);
            }
            HarvestEvent::PageFetched { page, candidates } => {
                if let Some(ref progress) = bar {
                    progress.set_message(format!("page {}: {} listings", page, candidates));
                }
            }
            HarvestEvent::ListingAccepted { accepted } => {
                if let Some(ref progress) = bar {
                    progress.set_position(accepted as u64);
                }
            }
            HarvestEvent::EnrichmentFailed { url, .. } => {
                if let Some(ref progress) = bar {
                    progress.set_message(format!("detail page failed: {}", url));
                }
            }
            HarvestEvent::StalePage { page } => {
                if let Some(ref progress) = bar {
                    progress.set_message(format!("page {}: nothing new", page));
                }
            }
            HarvestEvent::Finished { collected } => {
                if let Some(ref progress) = bar {
                    progress.finish_with_message(format!("{} listings collected", collected));
                }
            }
        }
    }

    if let Some(progress) = bar {
        if !progress.is_finished() {
            progress.abandon();
        }
    }
}

/// Loads the configuration file when one is given, otherwise the defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
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
