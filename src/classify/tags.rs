use std::collections::BTreeSet;

use crate::models::{Architecture, MajorMinor, PolicyFamily};
use crate::tables::{ARCHITECTURES, CP3_MINORS, PP3_MINORS};

/// Marker stored alongside interpreter tags when a release ships abi3 wheels.
pub const ABI3_MARKER: &str = "abi3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interpreter {
    CPython,
    PyPy,
    Generic,
    Other,
}

/// An interpreter tag such as `cp38`, `pp37` or `py3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonTag {
    pub interpreter: Interpreter,
    pub major: u32,
    pub minor: Option<u32>,
}

impl PythonTag {
    /// Parse a two-letter prefix followed by a numeric version (`cp310` is 3.10).
    pub fn parse(tag: &str) -> Option<Self> {
        let prefix = tag.get(..2)?;
        let digits = tag.get(2..)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let interpreter = match prefix {
            "cp" => Interpreter::CPython,
            "pp" => Interpreter::PyPy,
            "py" => Interpreter::Generic,
            _ => Interpreter::Other,
        };
        let major = digits.get(..1)?.parse().ok()?;
        let minor = match digits.get(1..) {
            Some("") | None => None,
            Some(rest) => Some(rest.parse().ok()?),
        };
        Some(Self { interpreter, major, minor })
    }

    fn is(&self, interpreter: Interpreter, major: u32, minor: u32) -> bool {
        self.interpreter == interpreter && self.major == major && self.minor == Some(minor)
    }
}

/// A platform tag split into its manylinux family and architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformTag {
    pub family: Option<PolicyFamily>,
    pub arch: Option<Architecture>,
}

impl PlatformTag {
    pub fn parse(tag: &str) -> Self {
        let known = ARCHITECTURES.iter().find_map(|arch| {
            tag.strip_suffix(arch.as_str())
                .and_then(|prefix| prefix.strip_suffix('_'))
                .map(|prefix| (prefix, *arch))
        });
        let (prefix, arch) = match known {
            Some((prefix, arch)) => (prefix, Some(arch)),
            None => (tag.rsplit_once('_').map_or(tag, |(prefix, _)| prefix), None),
        };
        Self { family: parse_family(prefix), arch }
    }
}

fn parse_family(prefix: &str) -> Option<PolicyFamily> {
    match prefix {
        "manylinux1" => Some(PolicyFamily::Manylinux1),
        "manylinux2010" => Some(PolicyFamily::Manylinux2010),
        "manylinux2014" => Some(PolicyFamily::Manylinux2014),
        other => {
            let (major, minor) = other.strip_prefix("manylinux_")?.split_once('_')?;
            Some(PolicyFamily::Perennial(MajorMinor::new(
                major.parse().ok()?,
                minor.parse().ok()?,
            )))
        }
    }
}

/// Coarse interpreter buckets published by the release stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImplementationBucket {
    Any2,
    Py2,
    Cp27,
    Pp27,
    Any3,
    Py3,
    Cp3(u32),
    Pp3(u32),
    Abi3,
}

impl std::fmt::Display for ImplementationBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImplementationBucket::Any2 => write!(f, "any2"),
            ImplementationBucket::Py2 => write!(f, "py2"),
            ImplementationBucket::Cp27 => write!(f, "cp27"),
            ImplementationBucket::Pp27 => write!(f, "pp27"),
            ImplementationBucket::Any3 => write!(f, "any3"),
            ImplementationBucket::Py3 => write!(f, "py3"),
            ImplementationBucket::Cp3(minor) => write!(f, "cp3{}", minor),
            ImplementationBucket::Pp3(minor) => write!(f, "pp3{}", minor),
            ImplementationBucket::Abi3 => write!(f, "abi3"),
        }
    }
}

/// Buckets in display order: Python 2 first, then 3.x by minor (CPython before PyPy), then abi3.
pub fn implementation_keys() -> Vec<ImplementationBucket> {
    use ImplementationBucket::*;

    let mut minors: Vec<ImplementationBucket> = CP3_MINORS
        .map(Cp3)
        .chain(PP3_MINORS.map(Pp3))
        .collect();
    minors.sort_by_key(|bucket| match bucket {
        Cp3(minor) => (*minor, 0),
        Pp3(minor) => (*minor, 1),
        _ => (u32::MAX, 2),
    });

    let mut keys = vec![Any2, Py2, Cp27, Pp27, Any3, Py3];
    keys.extend(minors);
    keys.push(Abi3);
    keys
}

/// Parsed tags of one release record.
#[derive(Debug, Clone, Default)]
pub struct ReleaseTags {
    pub python: BTreeSet<PythonTag>,
    pub abi3: bool,
    pub platforms: BTreeSet<PlatformTag>,
}

impl ReleaseTags {
    /// Parse `.`/`,`-joined interpreter and platform tag lists.
    ///
    /// Unrecognized interpreter tags are ignored.
    pub fn parse(python_tags: &str, platform_tags: &str) -> Self {
        let mut tags = ReleaseTags::default();
        for tag in split_tags(python_tags) {
            if tag == ABI3_MARKER {
                tags.abi3 = true;
            } else if let Some(parsed) = PythonTag::parse(tag) {
                tags.python.insert(parsed);
            }
        }
        tags.platforms = split_tags(platform_tags).map(PlatformTag::parse).collect();
        tags
    }

    pub fn has_architecture(&self, arch: Architecture) -> bool {
        self.platforms.iter().any(|p| p.arch == Some(arch))
    }

    /// Whether a wheel for `family` on x86_64 is present.
    pub fn has_policy(&self, family: PolicyFamily) -> bool {
        self.platforms
            .iter()
            .any(|p| p.family == Some(family) && p.arch == Some(Architecture::X86_64))
    }

    pub fn has_implementation(&self, bucket: ImplementationBucket) -> bool {
        use ImplementationBucket::*;
        use Interpreter::*;

        match bucket {
            Any2 => self.any_major(2),
            Any3 => self.any_major(3),
            Py2 => self.python.iter().any(|t| t.interpreter == Generic && t.major == 2),
            Py3 => self.python.iter().any(|t| t.interpreter == Generic && t.major == 3),
            Cp27 => self.python.iter().any(|t| t.is(CPython, 2, 7)),
            Pp27 => self.python.iter().any(|t| t.is(PyPy, 2, 7)),
            Cp3(minor) => self.python.iter().any(|t| {
                t.is(CPython, 3, minor) || (self.abi3 && t.abi3_covers(minor))
            }),
            Pp3(minor) => self.python.iter().any(|t| t.is(PyPy, 3, minor)),
            Abi3 => self.abi3,
        }
    }

    fn any_major(&self, major: u32) -> bool {
        self.python.iter().any(|t| {
            t.major == major && matches!(t.interpreter, Interpreter::CPython | Interpreter::PyPy | Interpreter::Generic)
        })
    }
}

impl PythonTag {
    /// abi3 wheels built for CPython 3.K load on every later 3.x minor.
    fn abi3_covers(&self, minor: u32) -> bool {
        self.interpreter == Interpreter::CPython
            && self.major == 3
            && self.minor.is_some_and(|built_for| built_for <= minor)
    }
}

fn split_tags(joined: &str) -> impl Iterator<Item = &str> {
    joined
        .split(['.', ','])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_tag() {
        let cp310 = PythonTag::parse("cp310").unwrap();
        assert_eq!(cp310.interpreter, Interpreter::CPython);
        assert_eq!((cp310.major, cp310.minor), (3, Some(10)));

        let py3 = PythonTag::parse("py3").unwrap();
        assert_eq!((py3.interpreter, py3.major, py3.minor), (Interpreter::Generic, 3, None));

        assert_eq!(PythonTag::parse("ip27").unwrap().interpreter, Interpreter::Other);
        assert!(PythonTag::parse("abi3").is_none());
        assert!(PythonTag::parse("cp").is_none());
        assert!(PythonTag::parse("cp3x").is_none());
    }

    #[test]
    fn test_parse_platform_tag() {
        let tag = PlatformTag::parse("manylinux2014_x86_64");
        assert_eq!(tag.family, Some(PolicyFamily::Manylinux2014));
        assert_eq!(tag.arch, Some(Architecture::X86_64));

        let tag = PlatformTag::parse("manylinux_2_17_aarch64");
        assert_eq!(tag.family, Some(PolicyFamily::Perennial(MajorMinor::new(2, 17))));
        assert_eq!(tag.arch, Some(Architecture::Aarch64));

        let tag = PlatformTag::parse("manylinux_2_31_armv7l");
        assert_eq!(tag.family, Some(PolicyFamily::Perennial(MajorMinor::new(2, 31))));
        assert_eq!(tag.arch, None);

        assert_eq!(PlatformTag::parse("linux_x86_64").family, None);
    }

    #[test]
    fn test_policy_requires_x86_64() {
        let tags = ReleaseTags::parse("cp38", "manylinux1_i686.manylinux2010_x86_64");
        assert!(tags.has_policy(PolicyFamily::Manylinux2010));
        assert!(!tags.has_policy(PolicyFamily::Manylinux1));
        assert!(tags.has_architecture(Architecture::I686));
        assert!(!tags.has_architecture(Architecture::Aarch64));
    }

    #[test]
    fn test_perennial_is_not_legacy() {
        let tags = ReleaseTags::parse("cp39", "manylinux_2_17_x86_64");
        assert!(!tags.has_policy(PolicyFamily::Manylinux2014));
        assert!(tags.has_policy(PolicyFamily::Perennial(MajorMinor::new(2, 17))));
    }

    #[test]
    fn test_cp310_does_not_imply_cp31x_prefix() {
        let tags = ReleaseTags::parse("cp310", "manylinux2014_x86_64");
        assert!(tags.has_implementation(ImplementationBucket::Cp3(10)));
        assert!(!tags.has_implementation(ImplementationBucket::Cp3(1)));
        assert!(!tags.has_implementation(ImplementationBucket::Cp3(11)));
    }

    #[test]
    fn test_abi3_forward_compatibility() {
        let tags = ReleaseTags::parse("cp37.abi3", "manylinux2014_x86_64");
        assert!(!tags.has_implementation(ImplementationBucket::Cp3(6)));
        for minor in 7..=*CP3_MINORS.end() {
            assert!(tags.has_implementation(ImplementationBucket::Cp3(minor)), "cp3{}", minor);
        }
        assert!(tags.has_implementation(ImplementationBucket::Abi3));
        assert!(!tags.has_implementation(ImplementationBucket::Pp3(8)));
    }

    #[test]
    fn test_without_abi3_no_forward_inference() {
        let tags = ReleaseTags::parse("cp37", "manylinux2014_x86_64");
        assert!(tags.has_implementation(ImplementationBucket::Cp3(7)));
        assert!(!tags.has_implementation(ImplementationBucket::Cp3(8)));
    }

    #[test]
    fn test_coarse_flags() {
        let tags = ReleaseTags::parse("py2.py3", "manylinux1_x86_64");
        assert!(tags.has_implementation(ImplementationBucket::Any2));
        assert!(tags.has_implementation(ImplementationBucket::Any3));
        assert!(tags.has_implementation(ImplementationBucket::Py2));
        assert!(!tags.has_implementation(ImplementationBucket::Cp27));

        let tags = ReleaseTags::parse("cp27,pp27", "manylinux1_x86_64");
        assert!(tags.has_implementation(ImplementationBucket::Any2));
        assert!(tags.has_implementation(ImplementationBucket::Cp27));
        assert!(tags.has_implementation(ImplementationBucket::Pp27));
        assert!(!tags.has_implementation(ImplementationBucket::Any3));
    }

    #[test]
    fn test_implementation_key_order() {
        let keys: Vec<String> = implementation_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(&keys[..8], ["any2", "py2", "cp27", "pp27", "any3", "py3", "cp35", "cp36"]);
        let cp37 = keys.iter().position(|k| k == "cp37").unwrap();
        assert_eq!(keys[cp37 + 1], "pp37");
        assert_eq!(keys.last().map(String::as_str), Some("abi3"));
        assert!(keys.iter().position(|k| k == "cp39") < keys.iter().position(|k| k == "cp310"));
    }
}
