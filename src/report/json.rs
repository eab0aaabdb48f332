use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One dashboard dimension: `{"keys": [...], "<key>": [value per index]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub keys: Vec<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Vec<f64>>,
}

impl Series {
    /// Build a series with one value per window for every key, in `keys` order.
    pub fn build<K, W, F>(keys: &[K], windows: &[W], value: F) -> Self
    where
        K: Display,
        F: Fn(&W, &K) -> f64,
    {
        let mut series = Series {
            keys: Vec::with_capacity(keys.len()),
            values: BTreeMap::new(),
        };
        for key in keys {
            let label = key.to_string();
            let row = windows.iter().map(|w| value(w, key)).collect();
            series.keys.push(label.clone());
            series.values.insert(label, row);
        }
        series
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.values.get(key).map(Vec::as_slice)
    }
}

/// Download-side document.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerReport {
    pub last_update: String,
    /// Ascending ISO dates.
    pub index: Vec<String>,
    pub glibc_version: Series,
    pub python_version: Series,
    pub policy_readiness: BTreeMap<String, Series>,
    pub glibc_readiness: BTreeMap<String, Series>,
    pub policy_at_least: Series,
}

/// Release-side document.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
    pub last_update: String,
    pub package_count: usize,
    /// Descending ISO dates (newest snapshot first).
    pub index: Vec<String>,
    pub lowest_policy: Series,
    pub highest_policy: Series,
    pub implementation: Series,
    pub architecture: Series,
}

pub fn iso_index(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

/// Human readable UTC timestamp, e.g. `Monday, 02 January 2023, 10:00:00 UTC`.
pub fn last_update(now: DateTime<Utc>) -> String {
    now.format("%A, %d %B %Y, %H:%M:%S UTC").to_string()
}

/// Serialize `document` compactly and replace `path` in one rename.
pub fn write_atomic<T: Serialize>(document: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let content = serde_json::to_string(document)?;
    std::fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_series_shape() {
        let windows = [1.0, 2.0, 3.0];
        let series = Series::build(&["x", "y"], &windows, |w, k| if *k == "x" { *w } else { -w });
        assert_eq!(series.keys, vec!["x", "y"]);
        assert_eq!(series.get("x"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(series.get("y"), Some(&[-1.0, -2.0, -3.0][..]));

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["keys"], serde_json::json!(["x", "y"]));
        assert_eq!(json["x"], serde_json::json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_last_update_format() {
        let now = Utc.with_ymd_and_hms(2023, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(last_update(now), "Monday, 02 January 2023, 10:00:00 UTC");
    }

    #[test]
    fn test_write_atomic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build").join("data.json");
        let series = Series::build(&["a"], &[0.5], |w, _| *w);
        write_atomic(&series, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, r#"{"keys":["a"],"a":[0.5]}"#);
        assert!(!dir.path().join("build").join("data.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_cleans_up_on_failure() {
        let dir = TempDir::new().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("data.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let series = Series::build(&["a"], &[0.5], |w, _| *w);
        assert!(write_atomic(&series, &path).is_err());
        assert!(!dir.path().join("data.json.tmp").exists());
    }
}
