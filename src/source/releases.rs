use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::wheel::WheelParser;
use crate::classify::tags::{Interpreter, PythonTag, ABI3_MARKER};
use crate::classify::version::Version;
use crate::models::ReleaseRecord;

/// Release cache document: the `releases` map of a PyPI JSON document.
#[derive(Debug, Deserialize)]
struct ReleaseCache {
    #[serde(default)]
    releases: BTreeMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    filename: String,
    upload_time: String,
}

/// A release file with a usable upload day.
#[derive(Debug, Clone)]
struct UploadedFile {
    filename: String,
    upload_day: NaiveDate,
}

/// Loader building one [`ReleaseRecord`] per kept `(package, version)`.
///
/// Packages come from a JSON array of names when `package_list` exists,
/// otherwise from every `*.json` document in `cache_dir`.
pub struct ReleaseSource {
    cache_dir: PathBuf,
    package_list: Option<PathBuf>,
    quiet: bool,
    wheels: WheelParser,
}

impl ReleaseSource {
    pub fn new(cache_dir: PathBuf, package_list: Option<PathBuf>, quiet: bool) -> Result<Self> {
        Ok(Self {
            cache_dir,
            package_list,
            quiet,
            wheels: WheelParser::new()?,
        })
    }

    fn packages(&self) -> Result<Vec<String>> {
        if let Some(list) = self.package_list.as_deref() {
            let content = std::fs::read_to_string(list)
                .with_context(|| format!("reading {}", list.display()))?;
            let packages: Vec<String> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", list.display()))?;
            return Ok(packages);
        }

        if !self.cache_dir.is_dir() {
            bail!("release cache directory {} does not exist", self.cache_dir.display());
        }
        let mut packages = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    packages.push(stem.to_string());
                }
            }
        }
        packages.sort();
        Ok(packages)
    }

    fn load_package(&self, package: &str) -> Result<Vec<ReleaseRecord>> {
        let path = cache_path(&self.cache_dir, package);
        if !path.exists() {
            debug!(package, "no release cache");
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cache: ReleaseCache = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        let releases = valid_files(package, cache);

        let versions = filter_versions(package, &releases);
        debug!(package, ?versions, "kept versions");

        let records: Vec<ReleaseRecord> = versions
            .iter()
            .filter_map(|version| {
                let files = releases.get(*version)?;
                self.parse_release(package, version, files)
            })
            .collect();
        if !versions.is_empty() && records.is_empty() {
            warn!(package, ?versions, "no manylinux wheel");
        }
        for record in &records {
            debug!(package, version = %record.version, day = %record.upload_day, "release kept");
        }
        Ok(records)
    }

    /// Collect interpreter and platform tags of the manylinux wheels of one release.
    fn parse_release(
        &self,
        package: &str,
        version: &str,
        files: &[UploadedFile],
    ) -> Option<ReleaseRecord> {
        let upload_day = files.iter().map(|f| f.upload_day).min()?;
        let mut pythons: BTreeSet<String> = BTreeSet::new();
        let mut platforms: BTreeSet<String> = BTreeSet::new();
        let mut abi3 = false;

        for file in files {
            if !file.filename.to_lowercase().ends_with(".whl") {
                continue;
            }
            let Some(wheel) = self.wheels.parse(&file.filename) else {
                warn!(package, filename = %file.filename, "invalid wheel name");
                continue;
            };
            if !wheel.platform_tag.contains("manylinux") {
                continue;
            }
            debug!(package, name = %wheel.name, version = %wheel.version, build = ?wheel.build, "manylinux wheel");
            for python in wheel.python_tag.split(['.', ',']) {
                let Some(tag) = PythonTag::parse(python) else {
                    warn!(package, filename = %file.filename, python, "ignoring python tag");
                    continue;
                };
                pythons.insert(python.to_string());
                if wheel.abi_tag == ABI3_MARKER {
                    if tag.interpreter == Interpreter::CPython && tag.major == 3 {
                        abi3 = true;
                    } else {
                        warn!(package, filename = %file.filename, python, "abi3 on a non-CPython 3 tag");
                    }
                }
            }
            platforms.extend(wheel.platform_tag.split('.').map(str::to_string));
        }

        if pythons.is_empty() || platforms.is_empty() {
            return None;
        }
        let mut python_tags: Vec<String> = pythons.into_iter().collect();
        python_tags.sort_by_key(|tag| {
            let number: u32 = tag.get(2..).and_then(|d| d.parse().ok()).unwrap_or(0);
            (number, tag.get(..2).unwrap_or_default().to_string())
        });
        if abi3 {
            python_tags.push(ABI3_MARKER.to_string());
        }

        Some(ReleaseRecord {
            upload_day,
            package: package.to_string(),
            version: version.to_string(),
            python_tags: python_tags.join("."),
            platform_tags: platforms.into_iter().collect::<Vec<_>>().join("."),
        })
    }
}

impl super::RecordSource for ReleaseSource {
    type Record = ReleaseRecord;

    fn load(&self) -> Result<Vec<ReleaseRecord>> {
        let packages = self.packages()?;
        info!(packages = packages.len(), "building release dataset");
        let pb = super::progress_bar(packages.len() as u64, self.quiet)?;

        let mut records = Vec::new();
        for package in &packages {
            pb.set_message(package.clone());
            match self.load_package(package) {
                Ok(rows) => records.extend(rows),
                Err(e) => warn!(package = %package, "skipping package: {:#}", e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        info!(rows = records.len(), "release dataset ready");
        Ok(records)
    }
}

pub fn cache_path(cache_dir: &Path, package: &str) -> PathBuf {
    cache_dir.join(format!("{}.json", package))
}

/// Drop file descriptors that do not deserialize or carry an unusable upload time.
fn valid_files(package: &str, cache: ReleaseCache) -> BTreeMap<String, Vec<UploadedFile>> {
    cache
        .releases
        .into_iter()
        .map(|(version, files)| {
            let files = files
                .into_iter()
                .filter_map(|value| {
                    let file: ReleaseFile = match serde_json::from_value(value) {
                        Ok(file) => file,
                        Err(e) => {
                            warn!(package, version = %version, "skipping file: {}", e);
                            return None;
                        }
                    };
                    let day = file
                        .upload_time
                        .get(..10)
                        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
                    match day {
                        Some(upload_day) => Some(UploadedFile { filename: file.filename, upload_day }),
                        None => {
                            warn!(package, filename = %file.filename, upload_time = %file.upload_time, "skipping file with invalid upload time");
                            None
                        }
                    }
                })
                .collect();
            (version, files)
        })
        .collect()
}

/// Versions worth tracking, newest first.
///
/// Walking versions in descending PEP 440 order, a version is kept only when it
/// was first uploaded strictly before the previously kept one. That keeps at most
/// one version per day and drops maintenance-branch releases.
fn filter_versions<'a>(package: &str, releases: &'a BTreeMap<String, Vec<UploadedFile>>) -> Vec<&'a str> {
    let mut candidates: Vec<(&str, Version)> = releases
        .keys()
        .filter_map(|version| match version.parse::<Version>() {
            Ok(parsed) => Some((version.as_str(), parsed)),
            Err(e) => {
                warn!(package, "{}", e);
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let mut kept = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    for (version, _) in candidates {
        let Some(uploaded) = releases
            .get(version)
            .and_then(|files| files.iter().map(|f| f.upload_day).min())
        else {
            continue;
        };
        if previous.map_or(true, |p| uploaded < p) {
            previous = Some(uploaded);
            kept.push(version);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RecordSource;
    use serde_json::json;
    use tempfile::TempDir;

    fn files(entries: &[(&str, &str)]) -> Vec<UploadedFile> {
        entries
            .iter()
            .map(|(filename, day)| UploadedFile {
                filename: filename.to_string(),
                upload_day: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_filter_versions_drops_backports_and_same_day() {
        let mut releases = BTreeMap::new();
        releases.insert("2.0".to_string(), files(&[("a.whl", "2023-03-01")]));
        // maintenance release uploaded after 2.0
        releases.insert("1.9.1".to_string(), files(&[("b.whl", "2023-04-01")]));
        releases.insert("1.9".to_string(), files(&[("c.whl", "2023-02-01")]));
        // same day as 1.9
        releases.insert("1.8".to_string(), files(&[("d.whl", "2023-02-01")]));
        releases.insert("1.0".to_string(), files(&[("e.whl", "2022-01-01")]));
        releases.insert("not a version".to_string(), files(&[("f.whl", "2021-01-01")]));
        releases.insert("0.9".to_string(), Vec::new());

        let kept = filter_versions("pkg", &releases);
        assert_eq!(kept, vec!["2.0", "1.9", "1.0"]);
    }

    #[test]
    fn test_filter_versions_uses_pep440_order() {
        let mut releases = BTreeMap::new();
        releases.insert("1.10".to_string(), files(&[("a.whl", "2023-03-01")]));
        releases.insert("1.9".to_string(), files(&[("b.whl", "2023-02-01")]));
        releases.insert("1.10rc1".to_string(), files(&[("c.whl", "2023-02-15")]));

        let kept = filter_versions("pkg", &releases);
        assert_eq!(kept, vec!["1.10", "1.10rc1", "1.9"]);
    }

    #[test]
    fn test_parse_release_collects_manylinux_tags() {
        let source = ReleaseSource::new(PathBuf::from("unused"), None, true).unwrap();
        let release = files(&[
            ("pkg-1.0.tar.gz", "2023-01-01"),
            ("pkg-1.0-cp38-abi3-manylinux_2_17_x86_64.manylinux2014_x86_64.whl", "2023-01-02"),
            ("pkg-1.0-cp310-cp310-macosx_10_9_x86_64.whl", "2023-01-02"),
            ("pkg-1.0-cp37-cp37m-manylinux1_i686.whl", "2023-01-03"),
            ("broken.whl", "2023-01-02"),
        ]);
        let record = source.parse_release("pkg", "1.0", &release).unwrap();
        assert_eq!(record.upload_day, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(record.python_tags, "cp37.cp38.abi3");
        assert_eq!(
            record.platform_tags,
            "manylinux1_i686.manylinux2014_x86_64.manylinux_2_17_x86_64"
        );
    }

    #[test]
    fn test_parse_release_without_manylinux_wheel() {
        let source = ReleaseSource::new(PathBuf::from("unused"), None, true).unwrap();
        let release = files(&[
            ("pkg-1.0.tar.gz", "2023-01-01"),
            ("pkg-1.0-py3-none-any.whl", "2023-01-01"),
        ]);
        assert!(source.parse_release("pkg", "1.0", &release).is_none());
    }

    #[test]
    fn test_load_from_cache_dir() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "releases": {
                "1.1": [
                    {"filename": "demo-1.1-cp39-cp39-manylinux2014_x86_64.whl", "upload_time": "2023-05-02T10:00:00"},
                    {"filename": "demo-1.1-cp39-cp39-manylinux2014_aarch64.whl"}
                ],
                "1.0": [
                    {"filename": "demo-1.0-cp39-cp39-manylinux2010_x86_64.whl", "upload_time": "2023-01-10T08:00:00"}
                ],
                "0.1": [
                    {"filename": "demo-0.1.tar.gz", "upload_time": "2022-01-01T00:00:00"}
                ]
            }
        });
        std::fs::write(cache_path(dir.path(), "demo"), doc.to_string()).unwrap();
        std::fs::write(cache_path(dir.path(), "broken"), "{not json").unwrap();

        let source = ReleaseSource::new(dir.path().to_path_buf(), None, true).unwrap();
        let records = source.load().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].package, "demo");
        assert_eq!(records[0].version, "1.1");
        assert_eq!(records[0].platform_tags, "manylinux2014_x86_64");
        assert_eq!(records[1].version, "1.0");
        assert_eq!(records[1].upload_day, NaiveDate::from_ymd_opt(2023, 1, 10).unwrap());
    }

    #[test]
    fn test_package_list_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("packages.json");
        std::fs::write(&list, r#"["missing"]"#).unwrap();
        std::fs::write(cache_path(dir.path(), "demo"), r#"{"releases": {}}"#).unwrap();

        let source = ReleaseSource::new(dir.path().to_path_buf(), Some(list), true).unwrap();
        assert_eq!(source.packages().unwrap(), vec!["missing".to_string()]);
        assert!(source.load().unwrap().is_empty());
    }

    #[test]
    fn test_missing_package_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(cache_path(dir.path(), "demo"), r#"{"releases": {}}"#).unwrap();
        let list = dir.path().join("typo.json");

        let source = ReleaseSource::new(dir.path().to_path_buf(), Some(list), true).unwrap();
        let err = source.packages().unwrap_err();
        assert!(format!("{:#}", err).contains("typo.json"));
        assert!(source.load().is_err());
    }
}
