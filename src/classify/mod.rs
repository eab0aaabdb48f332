//! Record classification: version normalization, interpreter/platform tags,
//! policy levels and glibc bucket consolidation.
//!
//! - [`version`]: PEP 440 parsing and `major.minor` normalization.
//! - [`tags`]: typed interpreter/platform tags and category membership.
//! - [`policy`]: policy level of a pip/glibc pair.
//! - [`bucket`]: coarse glibc buckets used for publication.

pub mod bucket;
pub mod policy;
pub mod tags;
pub mod version;
