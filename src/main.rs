//! Clipcrawl main entry point
//!
//! This is the command-line interface for the Clipcrawl ingestion service.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clipcrawl::admin::{self, AdminToken, AdminTrigger};
use clipcrawl::config::{load_settings_with_hash, CrawlConfig, CrawlDefaults, CrawlParams, Settings};
use clipcrawl::crawler::{self, build_http_client};
use clipcrawl::relay::{self, RelayConfig, ENV_ADMIN_TOKEN};
use clipcrawl::storage::{open_storage, MediaStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Clipcrawl: exercise-video ingestion crawler
///
/// Clipcrawl crawls fitness sites breadth-first within a page budget,
/// pairs exercise names with demonstration videos and upserts them into a
/// media database keyed by exercise name.
#[derive(Parser, Debug)]
#[command(name = "clipcrawl")]
#[command(version = "1.0.0")]
#[command(about = "Exercise-video ingestion crawler", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the admin HTTP endpoints
    Serve(ConfigArg),

    /// Run one crawl job locally and print its summary
    Crawl(CrawlArgs),

    /// Forward crawl parameters from the environment to the ingest endpoint
    Relay,

    /// Show stored media records
    Media(MediaArgs),
}

#[derive(Args, Debug)]
struct ConfigArg {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "clipcrawl.toml")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Seed URL (repeatable); defaults to the configured seeds
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum link depth from a seed
    #[arg(long)]
    max_depth: Option<i64>,

    /// Maximum number of fetch attempts
    #[arg(long)]
    max_pages: Option<i64>,

    /// Minimum milliseconds between fetch starts
    #[arg(long)]
    delay_ms: Option<i64>,

    /// Validate parameters and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct MediaArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Show only the record with this exercise name
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve(args) => handle_serve(&args.config).await,
        Command::Crawl(args) => handle_crawl(args).await,
        Command::Relay => handle_relay().await,
        Command::Media(args) => handle_media(args),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("clipcrawl=info,warn"),
            1 => EnvFilter::new("clipcrawl=debug,info"),
            2 => EnvFilter::new("clipcrawl=trace,debug"),
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

fn load(path: &Path) -> Result<Settings> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (settings, hash) = load_settings_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(settings)
}

fn open_store(settings: &Settings) -> Result<Arc<dyn MediaStore>> {
    let path = Path::new(&settings.output.database_path);
    let storage = open_storage(path)
        .with_context(|| format!("Failed to open media database {}", path.display()))?;
    Ok(Arc::new(storage))
}

/// Handles `serve`: binds the admin router and runs until Ctrl-C
async fn handle_serve(config_path: &Path) -> Result<()> {
    let settings = load(config_path)?;

    let raw_token = std::env::var(ENV_ADMIN_TOKEN)
        .with_context(|| format!("{} must be set", ENV_ADMIN_TOKEN))?;
    let token = AdminToken::new(&raw_token)
        .with_context(|| format!("{} must not be blank", ENV_ADMIN_TOKEN))?;

    let fetch_timeout = Duration::from_secs(settings.crawler.fetch_timeout_secs);
    let client = build_http_client(&settings.user_agent, fetch_timeout)?;
    let trigger = AdminTrigger::new(
        token,
        open_store(&settings)?,
        client,
        fetch_timeout,
        CrawlDefaults::from(&settings.crawler),
    );

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.bind))?;
    tracing::info!("Listening on {}", settings.server.bind);

    axum::serve(listener, admin::router(trigger))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

/// Handles `crawl`: runs one job in-process without the token gate
async fn handle_crawl(args: CrawlArgs) -> Result<()> {
    let settings = load(&args.config.config)?;

    let params = CrawlParams {
        seeds: (!args.seeds.is_empty()).then_some(args.seeds),
        max_depth: args.max_depth,
        max_pages: args.max_pages,
        delay_ms: args.delay_ms,
    };
    let config = CrawlConfig::resolve(params, &CrawlDefaults::from(&settings.crawler))?;

    if args.dry_run {
        print_dry_run(&config, &settings);
        return Ok(());
    }

    let fetch_timeout = Duration::from_secs(settings.crawler.fetch_timeout_secs);
    let summary = crawler::crawl(
        config,
        &settings.user_agent,
        fetch_timeout,
        open_store(&settings)?,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_dry_run(config: &CrawlConfig, settings: &Settings) {
    println!("=== Clipcrawl Dry Run ===\n");

    println!("Crawl:");
    println!("  Max depth: {}", config.max_depth);
    println!("  Max pages: {}", config.max_pages);
    println!("  Delay: {}ms", config.delay.as_millis());
    println!("  Link policy: {:?}", config.link_policy);
    if let Some(limit) = config.max_duration {
        println!("  Wall-clock limit: {}s", limit.as_secs());
    }

    println!("\nUser Agent: {}", settings.user_agent.header_value());
    println!("Database: {}", settings.output.database_path);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

async fn handle_relay() -> Result<()> {
    let config = RelayConfig::from_env()?;
    relay::run(config).await
}

/// Handles `media`: lists stored records
fn handle_media(args: MediaArgs) -> Result<()> {
    let settings = load(&args.config.config)?;
    let store = open_store(&settings)?;

    let records = match args.name {
        Some(name) => store.get(&name)?.into_iter().collect(),
        None => store.list()?,
    };

    if records.is_empty() {
        println!("No media records found");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}\t{}\t{}",
            record.name,
            record.video_url,
            record.updated_at.to_rfc3339()
        );
    }
    println!("\n{} record(s)", records.len());

    Ok(())
}
