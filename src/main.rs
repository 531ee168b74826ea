//! Roundcrawl main entry point
//!
//! This is the command-line interface for the interactive round-based crawler.

use anyhow::Context;
use clap::Parser;
use roundcrawl::config::{load_config_with_hash, validate, Config};
use roundcrawl::crawler::Coordinator;
use roundcrawl::shell::{Command, Shell};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// Roundcrawl: an interactive, round-based link crawler
///
/// Fetch a seed page, narrow the discovered links with filters, and crawl
/// the survivors one round at a time. Type `help` at the prompt for the list
/// of commands.
#[derive(Parser, Debug)]
#[command(name = "roundcrawl")]
#[command(version)]
#[command(about = "An interactive, round-based link crawler", long_about = None)]
struct Cli {
    /// URL to seed and crawl immediately
    #[arg(value_name = "URL")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory downloads are saved to (must exist)
    #[arg(short, long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Maximum number of fetches in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrency = concurrency;
        validate(&config).context("Invalid --concurrency")?;
    }

    let round_done = Arc::new(Notify::new());
    let notify = Arc::clone(&round_done);
    let coordinator = Coordinator::new(&config, move || notify.notify_one())
        .context("Failed to start the crawler")?;

    if let Some(dir) = &cli.save_dir {
        coordinator
            .set_output_dir(dir)
            .with_context(|| format!("Cannot save downloads to {}", dir.display()))?;
    }

    let shell = Shell::new(coordinator, round_done);

    if let Some(seed) = cli.seed {
        shell
            .execute(Command::Go(Some(seed)))
            .await
            .context("Initial round failed")?;
    }

    shell
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .context("Failed to read commands")?;

    Ok(())
}

/// Loads the configuration file if one was given, else the defaults
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("roundcrawl=info,warn"),
            1 => EnvFilter::new("roundcrawl=debug,info"),
            2 => EnvFilter::new("roundcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
