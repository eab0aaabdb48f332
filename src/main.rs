//! `manylinux-timeline`: compute manylinux adoption time series for a dashboard.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging.
//! 2. Load the config ([`config::load_config`]); CLI flags override it.
//! 3. Resolve the reporting range ([`range`]).
//! 4. Load download partitions or release caches ([`source`]).
//! 5. Classify records and aggregate them per window ([`classify`], [`stats`]).
//! 6. Write the JSON document atomically and print a summary ([`report`]).

mod classify;
mod cli;
mod config;
mod models;
mod range;
mod report;
mod source;
mod stats;
mod tables;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConsumerArgs, ReleaseArgs};
use config::{load_config, ConsumerConfig, ReleaseConfig};
use report::json::write_atomic;
use source::downloads::DownloadSource;
use source::releases::ReleaseSource;
use source::RecordSource;
use stats::consumer::ConsumerOptions;
use stats::release::ReleaseOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let config = load_config(&cwd, cli.config.as_deref())?;
    let today = Utc::now().date_naive();

    match cli.command {
        Command::Consumer(args) => run_consumer(args, &config.consumer, cli.quiet, today),
        Command::Release(args) => run_release(args, &config.release, cli.quiet, today),
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_consumer(args: ConsumerArgs, config: &ConsumerConfig, quiet: bool, today: NaiveDate) -> Result<()> {
    let (start, end) = range::consumer_range(args.start, args.end, today)?;
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let output = args.output.unwrap_or_else(|| config.output.clone());
    let opts = ConsumerOptions {
        start,
        end,
        window_days: config.window_days,
        python_versions: config.python_versions()?,
    };

    // the first reported day needs a full window of history
    let first_day = start - Duration::days(config.window_days);
    info!(%start, %end, data_dir = %data_dir.display(), "loading download partitions");
    let records = DownloadSource::new(data_dir, first_day, end, quiet).load()?;

    let report = stats::consumer::compute(&records, &opts, Utc::now());
    write_atomic(&report, &output)?;
    info!(path = %output.display(), days = report.index.len(), "wrote download statistics");

    if !quiet {
        report::terminal::render_consumer(&report, &output);
    }
    Ok(())
}

fn run_release(args: ReleaseArgs, config: &ReleaseConfig, quiet: bool, today: NaiveDate) -> Result<()> {
    let (start, end) = range::release_range(args.start, args.end, today)?;
    let cache_dir = args.cache_dir.unwrap_or_else(|| config.cache_dir.clone());
    let packages = args.packages.or_else(|| config.packages.clone());
    let output = args.output.unwrap_or_else(|| config.output.clone());
    let opts = ReleaseOptions {
        start,
        end,
        window_days: config.window_days(),
        step_days: config.step_days,
    };

    info!(%start, %end, cache_dir = %cache_dir.display(), "loading release cache");
    let records = ReleaseSource::new(cache_dir, packages, quiet)?.load()?;

    let report = stats::release::compute(&records, &opts, Utc::now());
    write_atomic(&report, &output)?;
    info!(path = %output.display(), packages = report.package_count, "wrote release statistics");

    if !quiet {
        report::terminal::render_release(&report, &output);
    }
    Ok(())
}
