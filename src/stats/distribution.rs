use std::collections::HashMap;
use std::hash::Hash;

/// Grouped counts of one window together with the window total.
///
/// Lookups of missing keys, and any lookup on an empty window, yield zero.
#[derive(Debug, Clone)]
pub struct Distribution<K> {
    counts: HashMap<K, u64>,
    total: u64,
}

impl<K: Eq + Hash> Default for Distribution<K> {
    fn default() -> Self {
        Self { counts: HashMap::new(), total: 0 }
    }
}

impl<K: Eq + Hash> Distribution<K> {
    /// Exclusive categories: the total is the sum of all counts.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
    {
        let mut dist = Self::default();
        for (key, count) in counts {
            dist.add(key, count);
            dist.total += count;
        }
        dist
    }

    /// Overlapping categories: the total is fixed up front (e.g. a package count).
    pub fn with_total(total: u64) -> Self {
        Self { counts: HashMap::new(), total }
    }

    pub fn add(&mut self, key: K, count: u64) {
        *self.counts.entry(key).or_insert(0) += count;
    }

    pub fn count(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn share(&self, key: &K) -> f64 {
        self.ratio(self.count(key))
    }

    fn ratio(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }
}

/// Share of each position at or above it in an ordered ladder.
///
/// `shares[i]` is the share of exactly rung `i`; the result at `i` is the
/// share of rungs `i..`.
pub fn at_least(shares: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    let mut out: Vec<f64> = shares
        .iter()
        .rev()
        .map(|share| {
            acc += share;
            acc
        })
        .collect();
    out.reverse();
    out
}

/// Convert a share to a percentage rounded to `decimals` places.
///
/// Rounds the exact binary value once, through decimal formatting.
pub fn percent(share: f64, decimals: u32) -> f64 {
    format!("{:.*}", decimals as usize, 100.0 * share)
        .parse()
        .unwrap_or(0.0)
}
