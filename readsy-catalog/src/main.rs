//! readsy-catalog - ISBN reconciliation CLI
//!
//! Reconciles each ISBN given on the command line against OpenLibrary,
//! Google Books and the local catalog, printing one JSON outcome per line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use readsy_catalog::services::Reconciler;
use readsy_common::config::{
    load_toml_config, LoggingConfig, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MODULE_NAME: &str = "readsy-catalog";

/// Command-line arguments for readsy-catalog
#[derive(Parser, Debug)]
#[command(name = "readsy-catalog")]
#[command(about = "Reconcile ISBNs against external sources and the local catalog")]
#[command(version)]
struct Args {
    /// Root folder holding readsy.db
    #[arg(long, global = true, env = "READSY_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/readsy/readsy-catalog.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile one or more ISBNs
    Reconcile {
        /// ISBNs (hyphens and spaces are ignored)
        #[arg(required = true)]
        isbns: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_config_file(args.config.clone());

    let toml_config = match resolver.config_file_path() {
        Some(path) => load_toml_config(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TomlConfig::default(),
    };

    init_logging(&toml_config.logging)?;

    info!(
        "Starting Readsy catalog (readsy-catalog) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolver.resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = readsy_common::db::init_database(&db_path)
        .await
        .context("Failed to open catalog database")?;

    let reconciler = Reconciler::from_pool(pool, &toml_config.sources)?;

    match args.command {
        Command::Reconcile { isbns } => {
            let mut failures = 0usize;
            for isbn in &isbns {
                match reconciler.reconcile(isbn).await {
                    Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
                    // A broken catalog fails every remaining ISBN too
                    Err(e) if e.is_persistence() => {
                        return Err(e).with_context(|| format!("Catalog unavailable at {}", isbn));
                    }
                    Err(e) => {
                        error!(isbn = %isbn, error = %e, "Reconciliation failed");
                        failures += 1;
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} of {} ISBNs failed", failures, isbns.len());
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// RUST_LOG wins over the configured level; output goes to the configured
/// log file, else stderr.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.open_file().context("Failed to open log file")? {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
