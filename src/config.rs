use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::classify::version::normalize_pair;
use crate::models::MajorMinor;
use crate::tables::DEFAULT_PYTHON_VERSIONS;

/// Root configuration structure, deserialized from `.manylinux-timeline/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub consumer: ConsumerConfig,
    pub release: ReleaseConfig,
}

/// Settings of the `consumer` run.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Length of the trailing download window, in days.
    pub window_days: i64,
    /// Root of the `YYYY/MM/DD.csv` partitions.
    pub data_dir: PathBuf,
    pub output: PathBuf,
    /// Python versions broken out in the per-version readiness series.
    pub python_versions: Vec<String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            data_dir: PathBuf::from("data"),
            output: PathBuf::from("consumer_data.json"),
            python_versions: DEFAULT_PYTHON_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl ConsumerConfig {
    /// Configured Python versions as `(major, minor)` pairs.
    pub fn python_versions(&self) -> Result<Vec<MajorMinor>> {
        self.python_versions
            .iter()
            .map(|raw| match normalize_pair(raw) {
                MajorMinor::UNKNOWN => bail!("invalid python version in config: '{}'", raw),
                version => Ok(version),
            })
            .collect()
    }
}

/// Settings of the `release` run.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Length of the trailing upload window, in weeks.
    pub window_weeks: i64,
    /// Distance between reporting dates, in days.
    pub step_days: i64,
    pub cache_dir: PathBuf,
    /// JSON list of packages; every cached package is used when absent.
    pub packages: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            window_weeks: 26,
            step_days: 7,
            cache_dir: PathBuf::from("cache"),
            packages: None,
            output: PathBuf::from("data.json"),
        }
    }
}

impl ReleaseConfig {
    pub fn window_days(&self) -> i64 {
        self.window_weeks * 7
    }
}

impl Config {
    fn validate(self) -> Result<Self> {
        if self.consumer.window_days < 1 {
            bail!("consumer.window_days must be at least 1");
        }
        if self.release.window_weeks < 1 {
            bail!("release.window_weeks must be at least 1");
        }
        if self.release.step_days < 1 {
            bail!("release.step_days must be at least 1");
        }
        self.consumer.python_versions()?;
        Ok(self)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<project_path>/.manylinux-timeline/config.toml`
/// 3. `~/.config/manylinux-timeline/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".manylinux-timeline").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("manylinux-timeline")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()
}
