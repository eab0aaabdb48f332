use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "manylinux-timeline",
    about = "Compute manylinux adoption time series from download and release data",
    version
)]
pub struct Cli {
    /// Config file [default: ./.manylinux-timeline/config.toml, fallback ~/.config/manylinux-timeline/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// No progress bars and no terminal summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download-side statistics from daily partition files
    Consumer(ConsumerArgs),
    /// Release-side statistics from the per-package release cache
    Release(ReleaseArgs),
}

#[derive(Args, Debug)]
pub struct ConsumerArgs {
    /// First reported day [default: end - 104 weeks]
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Day after the last reported day [default: today]
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,

    /// Root of the YYYY/MM/DD.csv partitions
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output JSON document
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Oldest reporting date, aligned to its week's Monday [default: end - 104 weeks]
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Newest reporting date, aligned to its week's Monday [default: one week before the current week]
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,

    /// Directory holding one <package>.json release document per package
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// JSON list of package names [default: every document in the cache]
    #[arg(long, value_name = "FILE")]
    pub packages: Option<PathBuf>,

    /// Output JSON document
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
