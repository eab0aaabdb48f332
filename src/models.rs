use chrono::NaiveDate;

/// A `(major, minor)` version pair, compared lexicographically.
///
/// The sentinel `0.0` stands for "unparseable" and satisfies no threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MajorMinor {
    pub major: u32,
    pub minor: u32,
}

impl MajorMinor {
    pub const UNKNOWN: MajorMinor = MajorMinor::new(0, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Split a normalized `"{major}.{minor}"` string back into numbers.
    ///
    /// Anything that is not exactly two numeric components maps to [`MajorMinor::UNKNOWN`].
    pub fn from_normalized(value: &str) -> Self {
        let mut parts = value.splitn(2, '.');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = parts.next().and_then(|p| p.parse().ok());
        match (major, minor) {
            (Some(major), Some(minor)) => Self { major, minor },
            _ => Self::UNKNOWN,
        }
    }
}

impl std::fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One row of a daily download partition, versions already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    pub day: NaiveDate,
    pub python_version: MajorMinor,
    pub pip_version: MajorMinor,
    pub glibc_version: MajorMinor,
    pub cpu: String,
    pub num_downloads: u64,
}

/// One `(package, version)` pair with at least one manylinux wheel.
///
/// `python_tags` and `platform_tags` are `.`-joined tag lists as collected from
/// the wheel filenames of that release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub upload_day: NaiveDate,
    pub package: String,
    pub version: String,
    pub python_tags: String,
    pub platform_tags: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Architecture {
    X86_64,
    I686,
    Aarch64,
    Ppc64le,
    S390x,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::I686 => "i686",
            Architecture::Aarch64 => "aarch64",
            Architecture::Ppc64le => "ppc64le",
            Architecture::S390x => "s390x",
        }
    }

    /// Architectures whose downloads take part in policy computation.
    pub fn is_policy_eligible(cpu: &str) -> bool {
        cpu == Architecture::X86_64.as_str() || cpu == Architecture::I686.as_str()
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named manylinux platform families as they appear in wheel platform tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicyFamily {
    Manylinux1,
    Manylinux2010,
    Manylinux2014,
    /// PEP 600 `manylinux_X_Y` tag.
    Perennial(MajorMinor),
}

impl std::fmt::Display for PolicyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyFamily::Manylinux1 => write!(f, "manylinux1"),
            PolicyFamily::Manylinux2010 => write!(f, "manylinux2010"),
            PolicyFamily::Manylinux2014 => write!(f, "manylinux2014"),
            PolicyFamily::Perennial(glibc) => {
                write!(f, "manylinux_{}_{}", glibc.major, glibc.minor)
            }
        }
    }
}

/// Number of policy tiers a pip/glibc pair satisfies (0 = "none").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PolicyLevel(pub u8);

impl PolicyLevel {
    pub fn name(&self) -> &'static str {
        crate::tables::policy_name(*self)
    }
}

impl std::fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_normalized() {
        assert_eq!(MajorMinor::from_normalized("3.10"), MajorMinor::new(3, 10));
        assert_eq!(MajorMinor::from_normalized("0.0"), MajorMinor::UNKNOWN);
        assert_eq!(MajorMinor::from_normalized("3"), MajorMinor::UNKNOWN);
        assert_eq!(MajorMinor::from_normalized("a.b"), MajorMinor::UNKNOWN);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(MajorMinor::new(2, 17) < MajorMinor::new(2, 28));
        assert!(MajorMinor::new(19, 3) < MajorMinor::new(20, 0));
        assert!(MajorMinor::new(3, 9) < MajorMinor::new(3, 10));
    }

    #[test]
    fn test_perennial_display() {
        let family = PolicyFamily::Perennial(MajorMinor::new(2, 28));
        assert_eq!(family.to_string(), "manylinux_2_28");
    }
}
