use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::classify::version::normalize_pair;
use crate::models::DownloadRecord;

const COLUMNS: [&str; 5] = [
    "python_version",
    "pip_version",
    "glibc_version",
    "cpu",
    "num_downloads",
];

/// Loader for the daily download partitions of `[first_day, end)`.
///
/// Days without a partition file are skipped; the run only fails when no
/// partition exists at all.
pub struct DownloadSource {
    data_dir: PathBuf,
    first_day: NaiveDate,
    end: NaiveDate,
    quiet: bool,
}

impl DownloadSource {
    pub fn new(data_dir: PathBuf, first_day: NaiveDate, end: NaiveDate, quiet: bool) -> Self {
        Self { data_dir, first_day, end, quiet }
    }
}

/// Location of the partition for `day`: `<data_dir>/YYYY/MM/DD.csv`.
pub fn partition_path(data_dir: &Path, day: NaiveDate) -> PathBuf {
    data_dir
        .join(day.format("%Y").to_string())
        .join(day.format("%m").to_string())
        .join(format!("{}.csv", day.format("%d")))
}

impl super::RecordSource for DownloadSource {
    type Record = DownloadRecord;

    fn load(&self) -> Result<Vec<DownloadRecord>> {
        let days: Vec<NaiveDate> = self
            .first_day
            .iter_days()
            .take_while(|day| *day < self.end)
            .collect();
        let pb = super::progress_bar(days.len() as u64, self.quiet)?;

        let mut records = Vec::new();
        let mut partitions = 0usize;
        for day in days {
            pb.inc(1);
            let path = partition_path(&self.data_dir, day);
            if !path.exists() {
                debug!(%day, "no download partition");
                continue;
            }
            records.extend(parse_partition(&path, day)?);
            partitions += 1;
        }
        pb.finish_and_clear();

        if partitions == 0 {
            bail!(
                "no download partition found in {} between {} and {}",
                self.data_dir.display(),
                self.first_day,
                self.end
            );
        }
        info!(partitions, rows = records.len(), "loaded download partitions");
        Ok(records)
    }
}

/// Parse one partition file; malformed rows are skipped with a warning.
fn parse_partition(path: &Path, day: NaiveDate) -> Result<Vec<DownloadRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let header = split_fields(header);
    let mut positions = [0usize; COLUMNS.len()];
    for (slot, column) in positions.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|h| *h == column)
            .with_context(|| format!("{}: missing column '{}'", path.display(), column))?;
    }
    let [python, pip, glibc, cpu, downloads] = positions;

    let mut records = Vec::new();
    for (number, line) in lines.enumerate() {
        let fields = split_fields(line);
        let field = |idx: usize| fields.get(idx).copied();
        let (Some(python), Some(pip), Some(glibc), Some(cpu), Some(downloads)) =
            (field(python), field(pip), field(glibc), field(cpu), field(downloads))
        else {
            warn!(file = %path.display(), line = number + 2, "skipping short row");
            continue;
        };
        let Ok(num_downloads) = downloads.parse::<u64>() else {
            warn!(file = %path.display(), line = number + 2, value = downloads, "skipping row with invalid download count");
            continue;
        };
        records.push(DownloadRecord {
            day,
            python_version: normalize_pair(python),
            pip_version: normalize_pair(pip),
            glibc_version: normalize_pair(glibc),
            cpu: cpu.to_string(),
            num_downloads,
        });
    }
    Ok(records)
}

/// Split a CSV line on commas, trimming whitespace and surrounding quotes.
fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"'))
        .collect()
}
