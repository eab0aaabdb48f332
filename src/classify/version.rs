use std::cmp::Ordering;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::models::MajorMinor;

/// Versions with a major component above this are treated as garbage.
const MAX_PLAUSIBLE_MAJOR: u64 = 50;

/// Normalize a raw version string to `"{major}.{minor}"`.
///
/// Never fails: unparseable or implausible input yields `"0.0"`.
pub fn normalize(raw: &str) -> String {
    plausible_pair(raw).to_string()
}

/// [`normalize`], split back into the numeric pair used for comparisons.
pub fn normalize_pair(raw: &str) -> MajorMinor {
    MajorMinor::from_normalized(&normalize(raw))
}

fn plausible_pair(raw: &str) -> MajorMinor {
    let Ok(version) = raw.parse::<Version>() else {
        return MajorMinor::UNKNOWN;
    };
    if version.major() > MAX_PLAUSIBLE_MAJOR {
        return MajorMinor::UNKNOWN;
    }
    match (u32::try_from(version.major()), u32::try_from(version.minor())) {
        (Ok(major), Ok(minor)) => MajorMinor::new(major, minor),
        _ => MajorMinor::UNKNOWN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LocalSegment {
    // Alphanumeric segments sort before numeric ones.
    Text(String),
    Number(u64),
}

/// A PEP 440 version.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<Vec<LocalSegment>>,
}

impl Version {
    pub fn major(&self) -> u64 {
        self.release.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u64 {
        self.release.get(1).copied().unwrap_or(0)
    }

    fn sort_key(&self) -> SortKey<'_> {
        let mut release = self.release.as_slice();
        while let [rest @ .., 0] = release {
            release = rest;
        }
        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => Bound::Low,
            (None, _, _) => Bound::High,
            (Some(pre), _, _) => Bound::Value(pre),
        };
        SortKey {
            epoch: self.epoch,
            release,
            pre,
            post: self.post.map_or(Bound::Low, Bound::Value),
            dev: self.dev.map_or(Bound::High, Bound::Value),
            local: self.local.as_deref().map_or(Bound::Low, Bound::Value),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    Low,
    Value(T),
    High,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    epoch: u64,
    release: &'a [u64],
    pre: Bound<(PreRelease, u64)>,
    post: Bound<u64>,
    dev: Bound<u64>,
    local: Bound<&'a [LocalSegment]>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        match Scanner::new(&lowered).version() {
            Some(version) => Ok(version),
            None => bail!("Invalid version: '{}'", raw),
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Single-pass scanner over a lowercased, trimmed version string.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        self.eat(".") || self.eat("-") || self.eat("_")
    }

    fn number(&mut self) -> Option<u64> {
        let len = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return None;
        }
        let value = self.rest()[..len]
            .bytes()
            .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')));
        self.pos += len;
        Some(value)
    }

    /// Optional `[-_.]?N`; the separator is only consumed when digits follow.
    fn trailing_number(&mut self) -> Option<u64> {
        let start = self.pos;
        self.eat_separator();
        match self.number() {
            Some(n) => Some(n),
            None => {
                self.pos = start;
                None
            }
        }
    }

    fn version(mut self) -> Option<Version> {
        self.eat("v");

        let start = self.pos;
        let epoch = match self.number() {
            Some(n) if self.rest().starts_with('!') => {
                self.pos += 1;
                n
            }
            _ => {
                self.pos = start;
                0
            }
        };

        let mut release = vec![self.number()?];
        loop {
            let before = self.pos;
            if !self.eat(".") {
                break;
            }
            match self.number() {
                Some(n) => release.push(n),
                None => {
                    self.pos = before;
                    break;
                }
            }
        }

        let pre = self.pre_release();
        let post = self.post_release();
        let dev = self.dev_release();
        let local = if self.eat("+") {
            Some(self.local()?)
        } else {
            None
        };

        if self.pos != self.input.len() {
            return None;
        }
        Some(Version { epoch, release, pre, post, dev, local })
    }

    fn pre_release(&mut self) -> Option<(PreRelease, u64)> {
        const LABELS: [(&str, PreRelease); 8] = [
            ("preview", PreRelease::Rc),
            ("alpha", PreRelease::Alpha),
            ("beta", PreRelease::Beta),
            ("pre", PreRelease::Rc),
            ("rc", PreRelease::Rc),
            ("a", PreRelease::Alpha),
            ("b", PreRelease::Beta),
            ("c", PreRelease::Rc),
        ];
        let start = self.pos;
        self.eat_separator();
        for (label, kind) in LABELS {
            if self.eat(label) {
                return Some((kind, self.trailing_number().unwrap_or(0)));
            }
        }
        self.pos = start;
        None
    }

    fn post_release(&mut self) -> Option<u64> {
        let start = self.pos;
        if self.eat("-") {
            if let Some(n) = self.number() {
                return Some(n);
            }
            self.pos = start;
        }
        self.eat_separator();
        for label in ["post", "rev", "r"] {
            if self.eat(label) {
                return Some(self.trailing_number().unwrap_or(0));
            }
        }
        self.pos = start;
        None
    }

    fn dev_release(&mut self) -> Option<u64> {
        let start = self.pos;
        self.eat_separator();
        if self.eat("dev") {
            return Some(self.trailing_number().unwrap_or(0));
        }
        self.pos = start;
        None
    }

    fn local(&mut self) -> Option<Vec<LocalSegment>> {
        let mut segments = Vec::new();
        loop {
            let len = self
                .rest()
                .bytes()
                .take_while(u8::is_ascii_alphanumeric)
                .count();
            if len == 0 {
                return None;
            }
            let text = &self.rest()[..len];
            segments.push(match text.parse::<u64>() {
                Ok(n) if text.bytes().all(|b| b.is_ascii_digit()) => LocalSegment::Number(n),
                _ => LocalSegment::Text(text.to_string()),
            });
            self.pos += len;
            if !self.eat_separator() {
                return Some(segments);
            }
        }
    }
}
