//! Loaders turning on-disk inputs into in-memory records.
//!
//! - [`downloads`]: daily download partitions (`YYYY/MM/DD.csv`).
//! - [`releases`]: per-package release caches (`<package>.json`).
//! - [`wheel`]: wheel filename parsing used by the release loader.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub mod downloads;
pub mod releases;
pub mod wheel;

pub trait RecordSource {
    type Record;

    fn load(&self) -> Result<Vec<Self::Record>>;
}

/// Progress bar over `len` work items; hidden when `quiet`.
pub(crate) fn progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
