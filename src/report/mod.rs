//! Output of computed time series.
//!
//! - [`json`]: the dashboard documents and their atomic writer.
//! - [`terminal`]: colored summary of the most recent window; respects `--quiet`.

pub mod json;
pub mod terminal;
