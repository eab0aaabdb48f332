//! Trailing-window aggregation.
//!
//! Two modes:
//! - [`trailing_sum`]: per-key sliding sum over the last `N` calendar days
//!   (download stats).
//! - [`snapshots`]: records of a trailing calendar span, deduplicated by entity
//!   (release stats).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use chrono::{Duration, NaiveDate};

/// Per-day counts keyed by category tuple.
pub type DailyCounts<K> = BTreeMap<NaiveDate, HashMap<K, u64>>;

/// A trailing calendar window `[end - length_days, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub end: NaiveDate,
    pub length_days: i64,
}

impl Window {
    pub fn start(&self) -> NaiveDate {
        self.end - Duration::days(self.length_days)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start() && day < self.end
    }
}

/// Build the per-day table in a single pass.
pub fn accumulate<K, I>(rows: I) -> DailyCounts<K>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (NaiveDate, K, u64)>,
{
    let mut daily: DailyCounts<K> = BTreeMap::new();
    for (day, key, count) in rows {
        *daily.entry(day).or_default().entry(key).or_insert(0) += count;
    }
    daily
}

/// Sliding sum over the `window_days` days ending at each day, inclusive.
///
/// Days absent from `daily` count as zero. The first days of the range use a
/// shorter window instead of being suppressed. Keys whose windowed sum is zero
/// are left out of the result.
pub fn trailing_sum<K>(daily: &DailyCounts<K>, window_days: i64) -> DailyCounts<K>
where
    K: Eq + Hash + Clone,
{
    let mut running: HashMap<K, u64> = HashMap::new();
    let mut live: VecDeque<(NaiveDate, &HashMap<K, u64>)> = VecDeque::new();
    let mut out = BTreeMap::new();

    for (day, counts) in daily {
        while let Some((oldest, expired)) = live.front() {
            if (*day - *oldest).num_days() < window_days {
                break;
            }
            for (key, count) in *expired {
                if let Some(sum) = running.get_mut(key) {
                    *sum -= count;
                    if *sum == 0 {
                        running.remove(key);
                    }
                }
            }
            live.pop_front();
        }

        for (key, count) in counts {
            if *count > 0 {
                *running.entry(key.clone()).or_insert(0) += count;
            }
        }
        live.push_back((*day, counts));
        out.insert(*day, running.clone());
    }
    out
}

/// Reporting dates from `end` back to `start` (both inclusive) every `step_days`.
pub fn reporting_dates(start: NaiveDate, end: NaiveDate, step_days: i64) -> Vec<NaiveDate> {
    let step = Duration::days(step_days.max(1));
    let mut dates = Vec::new();
    let mut current = end;
    while current >= start {
        dates.push(current);
        current -= step;
    }
    dates
}

/// Records of one window, at most one per entity.
#[derive(Debug)]
pub struct Snapshot<'a, R> {
    pub window: Window,
    pub members: Vec<&'a R>,
}

/// Deduplicated window contents for each reporting date.
///
/// `records` must be sorted newest first: the first record seen for an entity
/// is the one kept.
pub fn snapshots<'a, R, K, D, E>(
    records: &'a [R],
    dates: &[NaiveDate],
    length_days: i64,
    day_of: D,
    entity: E,
) -> Vec<Snapshot<'a, R>>
where
    K: Eq + Hash,
    D: Fn(&R) -> NaiveDate,
    E: Fn(&'a R) -> K,
{
    dates
        .iter()
        .map(|end| {
            let window = Window { end: *end, length_days };
            let mut seen = HashSet::new();
            let members = records
                .iter()
                .filter(|r| window.contains(day_of(*r)))
                .filter(|r| seen.insert(entity(*r)))
                .collect();
            Snapshot { window, members }
        })
        .collect()
}
