//! `metaprobe` command-line front end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metaprobe_core::AppConfig;
use metaprobe_db::Database;
use std::path::PathBuf;
use tracing::info;

mod commands;

#[derive(Parser)]
#[command(name = "metaprobe")]
#[command(about = "Crawl sites for public documents and report their metadata")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl one site, or every site in a domain list, and record documents
    Scan {
        /// Domain or URL to crawl
        #[arg(short, long, conflicts_with = "domains", required_unless_present = "domains")]
        target: Option<String>,

        /// File with one domain per line
        #[arg(short, long)]
        domains: Option<PathBuf>,

        /// Maximum link depth (defaults to the configured value)
        #[arg(long)]
        depth: Option<u32>,
    },

    /// List recorded artifacts
    List {
        /// Only artifacts filed under this domain
        #[arg(long)]
        domain: Option<String>,

        /// Case-insensitive search over filename, URL and metadata
        #[arg(short, long)]
        query: Option<String>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every record and downloaded file for a domain
    Clear {
        /// Domain label to purge
        domain: String,
    },

    /// Extract metadata from a local file without crawling
    Analyze {
        /// File to analyze
        file: PathBuf,
    },

    /// Show totals across the store
    Stats,
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,metaprobe=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };
    config.apply_env();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting metaprobe v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;
    let db_path = config.database_path()?;
    let db = Database::open(&db_path)
        .await
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;

    let outcome = match cli.command {
        Commands::Scan {
            target,
            domains,
            depth,
        } => {
            let depth = depth.unwrap_or(config.crawler.max_depth);
            commands::scan::run(&config, db.clone(), target, domains, depth).await
        }
        Commands::List {
            domain,
            query,
            json,
        } => commands::artifacts::list(&db, domain, query, json).await,
        Commands::Clear { domain } => commands::artifacts::clear(&db, &domain).await,
        Commands::Analyze { file } => commands::analyze::run(&config, db.clone(), &file).await,
        Commands::Stats => commands::artifacts::stats(&db).await,
    };

    db.close().await;
    outcome
}
