//! `serp-lookup`: serve the lookup service over stdin/stdout, or run a
//! one-shot extraction over a local file.
//!
//! All tracing output goes to stderr so that stdout remains a clean JSON
//! channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serp_extract::{Extractor, HttpSource, ResultStore};
use serp_lookup::bridge::run_stdio_bridge;
use serp_lookup::{LookupConfig, LookupService, StoreJanitor};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "serp-lookup")]
#[command(version)]
#[command(about = "Extract search results and resolve them by ID")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve newline-delimited JSON commands on stdin/stdout (default)
    Serve,
    /// Extract results from a saved results page and print them as JSON
    Extract {
        /// HTML file to read
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        num_results: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LookupConfig::load(cli.config.as_deref()).context("failed to load config")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Extract { file, num_results } => extract_file(&config, &file, num_results),
    }
}

async fn serve(config: LookupConfig) -> anyhow::Result<()> {
    tracing::info!("serp-lookup starting");
    let interval = Duration::from_secs(config.store.cleanup_interval_seconds);
    let source = HttpSource::new(&config.extract, &config.http)?;
    let service = LookupService::new(config, source)?;

    let cancel = CancellationToken::new();
    let janitor =
        StoreJanitor::new(Arc::clone(service.store()), interval, cancel.child_token()).spawn();

    let outcome = run_stdio_bridge(&service).await;

    cancel.cancel();
    let _ = janitor.await;

    outcome.map_err(|e| {
        tracing::error!(error = %e, "serp-lookup exited with error");
        anyhow::anyhow!("serp-lookup failed: {e}")
    })?;
    tracing::info!("serp-lookup shut down cleanly");
    Ok(())
}

fn extract_file(
    config: &LookupConfig,
    file: &std::path::Path,
    num_results: Option<usize>,
) -> anyhow::Result<()> {
    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let extractor = Extractor::new(config.extract.clone())?;
    let store = ResultStore::new(&config.store);
    let results = extractor.extract(
        &markup,
        num_results.unwrap_or(config.default_num_results),
        &store,
    )?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
