use crate::models::{Architecture, DownloadRecord, MajorMinor, PolicyLevel};
use crate::tables::{PolicyTier, POLICY_TIERS};

/// Whether a pip/glibc pair can install wheels of `tier`.
pub fn satisfies(tier: &PolicyTier, pip: MajorMinor, glibc: MajorMinor) -> bool {
    pip >= tier.min_pip && glibc >= tier.min_glibc
}

/// Count the tiers satisfied by a pip/glibc pair.
///
/// Unparseable versions normalize to `0.0`, which lands on level 0 ("none")
/// instead of being dropped.
pub fn policy_level(pip: MajorMinor, glibc: MajorMinor) -> PolicyLevel {
    let satisfied = POLICY_TIERS
        .iter()
        .filter(|tier| satisfies(tier, pip, glibc))
        .count();
    PolicyLevel(satisfied as u8)
}

/// Policy level of a download, or `None` when its CPU is outside x86_64/i686.
pub fn resolve(record: &DownloadRecord) -> Option<PolicyLevel> {
    if !Architecture::is_policy_eligible(&record.cpu) {
        return None;
    }
    Some(policy_level(record.pip_version, record.glibc_version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn record(python: &str, pip: &str, glibc: &str, cpu: &str, num_downloads: u64) -> DownloadRecord {
        DownloadRecord {
            day: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            python_version: MajorMinor::from_normalized(python),
            pip_version: MajorMinor::from_normalized(pip),
            glibc_version: MajorMinor::from_normalized(glibc),
            cpu: cpu.to_string(),
            num_downloads,
        }
    }

    #[test]
    fn test_single_day_scenario() {
        let rows = [
            record("3.8", "20.3", "2.17", "x86_64", 100),
            record("3.8", "19.0", "2.12", "x86_64", 50),
            record("2.7", "8.1", "2.5", "x86_64", 10),
            record("3.9", "20.3", "2.17", "aarch64", 1000),
        ];
        let levels: Vec<_> = rows.iter().map(resolve).collect();

        // manylinux1, 2010, 2014 and 2_17; 2_19 needs a newer glibc
        assert_eq!(levels[0], Some(PolicyLevel(4)));
        assert_eq!(levels[0].unwrap().name(), "manylinux_2_17");
        // pip 19.0 is below the 19.3 gate of manylinux2014
        assert_eq!(levels[1], Some(PolicyLevel(2)));
        assert_eq!(levels[1].unwrap().name(), "manylinux2010");
        assert_eq!(levels[2], Some(PolicyLevel(1)));
        assert_eq!(levels[3], None);
    }

    #[test]
    fn test_unknown_versions_are_level_zero() {
        let row = record("3.8", "0.0", "2.17", "i686", 1);
        assert_eq!(resolve(&row), Some(PolicyLevel(0)));
        assert_eq!(policy_level(MajorMinor::new(23, 0), MajorMinor::UNKNOWN), PolicyLevel(0));
    }

    #[test]
    fn test_newest_pair_satisfies_everything() {
        let level = policy_level(MajorMinor::new(24, 0), MajorMinor::new(2, 39));
        assert_eq!(level, PolicyLevel(POLICY_TIERS.len() as u8));
        assert_eq!(level.name(), "manylinux_2_35");
    }

    #[test]
    fn test_pip_gate_between_2014_and_perennial() {
        // glibc is new enough for everything but pip predates PEP 600
        let level = policy_level(MajorMinor::new(20, 2), MajorMinor::new(2, 35));
        assert_eq!(level.name(), "manylinux2014");
    }

    proptest! {
        #[test]
        fn level_is_monotonic(
            pip_major in 0u32..30, pip_minor in 0u32..5,
            glibc_minor in 0u32..40,
            bump_pip in 0u32..3, bump_glibc in 0u32..5,
        ) {
            let pip = MajorMinor::new(pip_major, pip_minor);
            let glibc = MajorMinor::new(2, glibc_minor);
            let base = policy_level(pip, glibc);
            let newer_pip = MajorMinor::new(pip_major, pip_minor + bump_pip);
            let newer_glibc = MajorMinor::new(2, glibc_minor + bump_glibc);
            prop_assert!(policy_level(newer_pip, glibc) >= base);
            prop_assert!(policy_level(pip, newer_glibc) >= base);
            prop_assert!(policy_level(newer_pip, newer_glibc) >= base);
        }
    }
}
