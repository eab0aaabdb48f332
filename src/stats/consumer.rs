//! Download-side adoption statistics.
//!
//! Rows are reduced to `(python, glibc bucket, policy level)` keys, summed over a
//! trailing day window and turned into per-dimension shares.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::distribution::{at_least, percent, Distribution};
use super::window::{accumulate, trailing_sum};
use crate::classify::bucket::{consolidate, publication_order};
use crate::classify::policy::resolve;
use crate::models::{DownloadRecord, MajorMinor, PolicyLevel};
use crate::report::json::{iso_index, last_update, ConsumerReport, Series};
use crate::tables::{policy_levels_desc, Bucket, GLIBC_BUCKETS, POLICY_LEVEL_COUNT};

#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub window_days: i64,
    pub python_versions: Vec<MajorMinor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DownloadKey {
    python: MajorMinor,
    /// Bucket label; `None` outside every bucket.
    glibc: Option<MajorMinor>,
    level: PolicyLevel,
}

/// Downloads of one Python version inside a window.
#[derive(Debug)]
struct Slice {
    levels: Distribution<PolicyLevel>,
    glibc: Distribution<Option<MajorMinor>>,
}

/// Grouped downloads of one reporting day.
#[derive(Debug)]
struct ConsumerWindow {
    python: Distribution<MajorMinor>,
    glibc: Distribution<Option<MajorMinor>>,
    /// Share of downloads at or above each level, indexed by level.
    at_least: Vec<f64>,
    slices: HashMap<MajorMinor, Slice>,
}

impl ConsumerWindow {
    fn new(counts: &HashMap<DownloadKey, u64>) -> Self {
        let python = Distribution::from_counts(counts.iter().map(|(k, c)| (k.python, *c)));
        let glibc = Distribution::from_counts(counts.iter().map(|(k, c)| (k.glibc, *c)));
        let levels = Distribution::from_counts(counts.iter().map(|(k, c)| (k.level, *c)));
        let shares: Vec<f64> = (0..POLICY_LEVEL_COUNT as u8)
            .map(|level| levels.share(&PolicyLevel(level)))
            .collect();

        let mut grouped: HashMap<MajorMinor, Vec<(&DownloadKey, u64)>> = HashMap::new();
        for (key, count) in counts {
            grouped.entry(key.python).or_default().push((key, *count));
        }
        // both shares of a slice use the slice total as denominator
        let slices = grouped
            .into_iter()
            .map(|(python, rows)| {
                let slice = Slice {
                    levels: Distribution::from_counts(rows.iter().map(|(k, c)| (k.level, *c))),
                    glibc: Distribution::from_counts(rows.iter().map(|(k, c)| (k.glibc, *c))),
                };
                (python, slice)
            })
            .collect();

        Self { python, glibc, at_least: at_least(&shares), slices }
    }

    fn slice(&self, python: MajorMinor) -> Option<&Slice> {
        self.slices.get(&python)
    }
}

/// Compute the download-side document for `[start, end)`.
///
/// `records` should cover `window_days` of history before `start`. The index
/// holds every loaded day of the range whose windowed total is non-zero.
pub fn compute(records: &[DownloadRecord], opts: &ConsumerOptions, now: DateTime<Utc>) -> ConsumerReport {
    let daily = accumulate(records.iter().filter_map(|r| {
        let level = resolve(r)?;
        let key = DownloadKey {
            python: r.python_version,
            glibc: consolidate(r.glibc_version, &GLIBC_BUCKETS),
            level,
        };
        Some((r.day, key, r.num_downloads))
    }));
    let windowed = trailing_sum(&daily, opts.window_days);

    let (days, windows): (Vec<NaiveDate>, Vec<ConsumerWindow>) = windowed
        .iter()
        .filter(|(day, counts)| **day >= opts.start && **day < opts.end && !counts.is_empty())
        .map(|(day, counts)| (*day, ConsumerWindow::new(counts)))
        .unzip();
    info!(days = days.len(), window_days = opts.window_days, "computed download windows");

    let buckets: Vec<&Bucket> = publication_order(&GLIBC_BUCKETS).collect();
    let levels: Vec<PolicyLevel> = policy_levels_desc().collect();
    let tiers: Vec<PolicyLevel> = levels.iter().copied().filter(|l| l.0 > 0).collect();

    let glibc_version = Series::build(&buckets, &windows, |w, b| {
        percent(w.glibc.share(&Some(b.label())), 2)
    });
    let python_version = Series::build(&opts.python_versions, &windows, |w, v| {
        percent(w.python.share(v), 1)
    });
    let policy_at_least = Series::build(&tiers, &windows, |w, level| {
        percent(w.at_least.get(level.0 as usize).copied().unwrap_or(0.0), 2)
    });

    let mut policy_readiness = BTreeMap::new();
    let mut glibc_readiness = BTreeMap::new();
    for python in &opts.python_versions {
        let readiness = Series::build(&levels, &windows, |w, level| {
            w.slice(*python).map_or(0.0, |s| percent(s.levels.share(level), 2))
        });
        let glibc = Series::build(&buckets, &windows, |w, b| {
            w.slice(*python)
                .map_or(0.0, |s| percent(s.glibc.share(&Some(b.label())), 2))
        });
        policy_readiness.insert(python.to_string(), readiness);
        glibc_readiness.insert(python.to_string(), glibc);
    }

    ConsumerReport {
        last_update: last_update(now),
        index: iso_index(&days),
        glibc_version,
        python_version,
        policy_readiness,
        glibc_readiness,
        policy_at_least,
    }
}
