//! HH Harvester main entry point
//!
//! This is the command-line interface for the hh.ru vacancy harvester.

use clap::Parser;
use hh_harvester::config::{load_or_create_config, validate, Config};
use hh_harvester::storage::{open_storage, RunStatus, VacancyStore};
use hh_harvester::{each_vacancy, SearchQuery, SourceKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// HH Harvester: a vacancy ingestion pipeline for hh.ru
///
/// Pulls vacancies matching a search query, either through the public API or
/// by scraping the rendered search pages, and stores a bounded, deduplicated
/// set of them with their normalized skills in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "hh-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A vacancy harvester for hh.ru", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (generated with defaults if missing)
    #[arg(value_name = "CONFIG", default_value = "settings.toml")]
    config: PathBuf,

    /// Use the JSON API instead of scraping search pages
    #[arg(long)]
    api: bool,

    /// Override the configured search query
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,

    /// Override the configured vacancy limit
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let generated = !cli.config.exists();
    let loaded = load_or_create_config(&cli.config);

    // Flags win over the configured level
    let configured_level = loaded.as_ref().ok().map(|(cfg, _)| cfg.log.level.clone());
    setup_logging(cli.verbose, cli.quiet, configured_level.as_deref());

    if generated {
        tracing::info!(
            "Default configuration was generated to {}",
            cli.config.display()
        );
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match loaded {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, cli.query, cli.limit)?;
    let kind = SourceKind::from_use_api(cli.api);

    if cli.dry_run {
        handle_dry_run(&config, kind);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, kind).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, configured_level: Option<&str>) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => match configured_level {
                Some(level) => EnvFilter::new(format!("hh_harvester={},warn", level)),
                None => EnvFilter::new("hh_harvester=info,warn"),
            },
            1 => EnvFilter::new("hh_harvester=debug,info"),
            2 => EnvFilter::new("hh_harvester=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(
    config: &mut Config,
    query: Option<String>,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(query) = query {
        tracing::debug!("Query overridden from the command line: {}", query);
        config.search.query = query;
    }
    if let Some(limit) = limit {
        tracing::debug!("Limit overridden from the command line: {}", limit);
        config.search.limit = limit;
    }

    validate(config)?;
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, kind: SourceKind) {
    println!("=== HH Harvester Dry Run ===\n");

    println!("Search:");
    println!("  Query: {}", config.search.query);
    println!("  Limit: {}", config.search.limit);
    println!("  Page size: {}", config.search.prefetch);

    println!("\nSource: {}", kind.as_str());
    match kind {
        SourceKind::Api => println!("  Listing: {}", config.provider.api_endpoint),
        SourceKind::Html => {
            println!("  Listing: {}", config.provider.search_endpoint);
            println!("  Details: {}", config.provider.vacancy_details_endpoint);
        }
    }
    println!(
        "  Request timeout: {}s",
        config.provider.request_timeout_in_seconds
    );
    println!(
        "  Detail concurrency: {}",
        config.provider.detail_concurrency
    );

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms (max {}ms)",
        config.retry.backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} vacancies for \"{}\"",
        config.search.limit, config.search.query
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use hh_harvester::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, 10)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
///
/// Whatever the run yielded before a failure is still stored; the run is
/// then recorded as failed and the error is returned.
async fn handle_harvest(config: Config, kind: SourceKind) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let mut storage = open_storage(Path::new(&config.output.database_path))?;

    let query = SearchQuery::from_config(&config.search, kind);
    tracing::info!(
        "Harvesting up to {} vacancies for \"{}\" via {}",
        query.limit,
        query.text,
        kind.as_str()
    );
    let run_id = storage.create_run(&query.text, kind.as_str())?;

    let stream = match each_vacancy(&config, query) {
        Ok(stream) => stream,
        Err(e) => {
            storage.finish_run(run_id, RunStatus::Failed, 0)?;
            return Err(e.into());
        }
    };
    let outcome = stream.collect_all().await;

    let saved = match storage.replace_all(run_id, &outcome.vacancies) {
        Ok(saved) => saved,
        Err(e) => {
            tracing::error!("Failed to store vacancies, keeping the previous set: {}", e);
            storage.finish_run(run_id, RunStatus::Failed, 0)?;
            return Err(e.into());
        }
    };

    let status = if outcome.error.is_some() {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    };
    storage.finish_run(run_id, status, saved as u64)?;
    tracing::info!("Harvest run {} took {:.2?}", run_id, started.elapsed());

    match outcome.error {
        Some(e) => {
            tracing::error!("Harvest failed after storing {} vacancies: {}", saved, e);
            Err(e.into())
        }
        None => {
            println!(
                "Harvested {} vacancies into {}",
                saved, config.output.database_path
            );
            Ok(())
        }
    }
}
