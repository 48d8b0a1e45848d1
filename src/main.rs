//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl single-host crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{load_config, Config};
use ripple_crawl::crawler::crawl;
use ripple_crawl::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a single-host concurrent web crawler
///
/// Fetches the seed page, follows every link on the seed's domain and prints
/// each page it fetched successfully, one URL per line.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A single-host concurrent web crawler", long_about = None)]
struct Cli {
    /// Seed URL; `http://` is assumed when no scheme is given
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch calls admitted per period (overrides the config file)
    #[arg(long, value_name = "N")]
    calls_per_period: Option<usize>,

    /// Rate limit period in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    period_ms: Option<u64>,

    /// Stop waiting after this many seconds (overrides the config file)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print crawl statistics when done
    #[arg(long)]
    stats: bool,

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

    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "Configuration resolved");

    let crawler = crawl(&config, &cli.url, |url| println!("{}", url))
        .await
        .with_context(|| format!("crawl of {} failed", cli.url))?;

    if cli.stats {
        print_statistics(&crawler.stats());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only discovered URLs.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file, if any, and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(calls) = cli.calls_per_period {
        config.rate_limit.calls_per_period = calls;
    }
    if let Some(period_ms) = cli.period_ms {
        config.rate_limit.period_ms = period_ms;
    }
    if let Some(timeout) = cli.timeout {
        anyhow::ensure!(timeout > 0, "--timeout must be at least 1 second");
        config.crawler.wait_timeout_secs = Some(timeout);
    }

    Ok(config)
}
