//! Statistics generators.
//!
//! [`consumer`] reduces download rows to trailing-sum shares; [`release`]
//! reduces release records to deduplicated package snapshots. Both share the
//! window and distribution helpers.

pub mod consumer;
pub mod distribution;
pub mod release;
pub mod window;
