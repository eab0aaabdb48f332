//! Static lookup tables shared by the classifiers and the stats generators.
//!
//! Everything here is plain data so the resolvers can be tested against the
//! tables directly.

use std::ops::RangeInclusive;

use crate::models::{Architecture, MajorMinor, PolicyFamily, PolicyLevel};

/// One compatibility tier: the oldest pip and glibc able to use its wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyTier {
    pub name: &'static str,
    pub min_pip: MajorMinor,
    pub min_glibc: MajorMinor,
}

const fn tier(name: &'static str, pip: (u32, u32), glibc: (u32, u32)) -> PolicyTier {
    PolicyTier {
        name,
        min_pip: MajorMinor::new(pip.0, pip.1),
        min_glibc: MajorMinor::new(glibc.0, glibc.1),
    }
}

/// Ordered tiers; thresholds never decrease from one tier to the next.
pub const POLICY_TIERS: [PolicyTier; 13] = [
    tier("manylinux1", (8, 1), (2, 5)),
    tier("manylinux2010", (19, 0), (2, 12)),
    tier("manylinux2014", (19, 3), (2, 17)),
    tier("manylinux_2_17", (20, 3), (2, 17)),
    tier("manylinux_2_19", (20, 3), (2, 19)),
    tier("manylinux_2_23", (20, 3), (2, 23)),
    tier("manylinux_2_24", (20, 3), (2, 24)),
    tier("manylinux_2_26", (20, 3), (2, 26)),
    tier("manylinux_2_27", (20, 3), (2, 27)),
    tier("manylinux_2_28", (20, 3), (2, 28)),
    tier("manylinux_2_31", (20, 3), (2, 31)),
    tier("manylinux_2_34", (20, 3), (2, 34)),
    tier("manylinux_2_35", (20, 3), (2, 35)),
];

/// Number of distinct policy levels, "none" included.
pub const POLICY_LEVEL_COUNT: usize = POLICY_TIERS.len() + 1;

/// Display name of a policy level: level 0 is "none", level k is tier k-1.
pub fn policy_name(level: PolicyLevel) -> &'static str {
    match level.0 as usize {
        0 => "none",
        n => POLICY_TIERS.get(n - 1).map_or("unknown", |t| t.name),
    }
}

/// All policy levels, highest first (the order the dashboard lists them).
pub fn policy_levels_desc() -> impl Iterator<Item = PolicyLevel> {
    (0..POLICY_LEVEL_COUNT as u8).rev().map(PolicyLevel)
}

/// A consolidated glibc bucket; its label is the oldest member.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    pub members: &'static [MajorMinor],
}

impl Bucket {
    pub fn label(&self) -> MajorMinor {
        self.members.first().copied().unwrap_or(MajorMinor::UNKNOWN)
    }

    pub fn contains(&self, version: MajorMinor) -> bool {
        self.members.contains(&version)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

const fn g(minor: u32) -> MajorMinor {
    MajorMinor::new(2, minor)
}

/// glibc partitions, oldest first.
pub const GLIBC_BUCKETS: [Bucket; 12] = [
    Bucket { members: &[g(5), g(6), g(7), g(8), g(9), g(10), g(11)] },
    Bucket { members: &[g(12), g(13), g(14), g(15), g(16)] },
    Bucket { members: &[g(17), g(18)] },
    Bucket { members: &[g(19), g(20), g(21), g(22)] },
    Bucket { members: &[g(23)] },
    Bucket { members: &[g(24), g(25)] },
    Bucket { members: &[g(26)] },
    Bucket { members: &[g(27)] },
    Bucket { members: &[g(28), g(29), g(30)] },
    Bucket { members: &[g(31), g(32), g(33)] },
    Bucket { members: &[g(34)] },
    Bucket { members: &[g(35), g(36)] },
];

pub const ARCHITECTURES: [Architecture; 5] = [
    Architecture::X86_64,
    Architecture::I686,
    Architecture::Aarch64,
    Architecture::Ppc64le,
    Architecture::S390x,
];

/// Policies tracked by the release stats, oldest first.
pub const LEGACY_POLICIES: [PolicyFamily; 3] = [
    PolicyFamily::Manylinux1,
    PolicyFamily::Manylinux2010,
    PolicyFamily::Manylinux2014,
];

/// CPython 3 minors with their own implementation bucket.
pub const CP3_MINORS: RangeInclusive<u32> = 5..=13;

/// PyPy 3 minors with their own implementation bucket.
pub const PP3_MINORS: RangeInclusive<u32> = 7..=10;

pub const DEFAULT_PYTHON_VERSIONS: [&str; 10] = [
    "2.7", "3.5", "3.6", "3.7", "3.8", "3.9", "3.10", "3.11", "3.12", "3.13",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_monotonic() {
        for pair in POLICY_TIERS.windows(2) {
            assert!(pair[0].min_pip <= pair[1].min_pip, "{}", pair[1].name);
            assert!(pair[0].min_glibc <= pair[1].min_glibc, "{}", pair[1].name);
        }
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(policy_name(PolicyLevel(0)), "none");
        assert_eq!(policy_name(PolicyLevel(1)), "manylinux1");
        assert_eq!(policy_name(PolicyLevel(13)), "manylinux_2_35");
        assert_eq!(policy_name(PolicyLevel(14)), "unknown");
    }

    #[test]
    fn test_levels_desc() {
        let levels: Vec<_> = policy_levels_desc().collect();
        assert_eq!(levels.len(), 14);
        assert_eq!(levels[0], PolicyLevel(13));
        assert_eq!(levels[13], PolicyLevel(0));
    }

    #[test]
    fn test_buckets_disjoint_and_ordered() {
        let mut seen = std::collections::HashSet::new();
        let mut previous = MajorMinor::UNKNOWN;
        for bucket in &GLIBC_BUCKETS {
            assert!(bucket.label() > previous);
            previous = bucket.label();
            for member in bucket.members {
                assert!(seen.insert(*member), "{} listed twice", member);
                assert!(*member >= bucket.label());
            }
        }
    }
}
