use anyhow::Result;
use regex::Regex;

/// Components of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelInfo {
    pub name: String,
    pub version: String,
    pub build: Option<String>,
    pub python_tag: String,
    pub abi_tag: String,
    pub platform_tag: String,
}

/// Parser for `{name}-{ver}(-{build})?-{python}-{abi}-{platform}.whl`.
pub struct WheelParser {
    re: Regex,
}

impl WheelParser {
    pub fn new() -> Result<Self> {
        let re = Regex::new(
            r"^(?P<name>[^\s-]+?)-(?P<ver>[^\s-]+?)(?:-(?P<build>\d[^-]*?))?-(?P<pyver>[^\s-]+?)-(?P<abi>[^\s-]+?)-(?P<plat>[^\s-]+?)\.(?i:whl)$",
        )?;
        Ok(Self { re })
    }

    /// Parse `filename`, returning `None` when it is not a well-formed wheel name.
    pub fn parse(&self, filename: &str) -> Option<WheelInfo> {
        let caps = self.re.captures(filename)?;
        Some(WheelInfo {
            name: caps["name"].to_string(),
            version: caps["ver"].to_string(),
            build: caps.name("build").map(|m| m.as_str().to_string()),
            python_tag: caps["pyver"].to_string(),
            abi_tag: caps["abi"].to_string(),
            platform_tag: caps["plat"].to_string(),
        })
    }
}
