//! Release-side adoption statistics.
//!
//! Each reporting date looks back over a fixed window of uploads, keeps the
//! newest release of every package and reports shares of packages.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info};

use super::distribution::{percent, Distribution};
use super::window::{reporting_dates, snapshots};
use crate::classify::tags::{implementation_keys, ImplementationBucket, ReleaseTags};
use crate::models::{Architecture, PolicyFamily, ReleaseRecord};
use crate::report::json::{iso_index, last_update, ReleaseReport, Series};
use crate::tables::{ARCHITECTURES, LEGACY_POLICIES};

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub window_days: i64,
    pub step_days: i64,
}

/// A release with its tags parsed once up front.
struct Tagged<'a> {
    record: &'a ReleaseRecord,
    tags: ReleaseTags,
}

/// Package shares of one snapshot.
struct ReleaseWindow {
    highest: Distribution<PolicyFamily>,
    lowest: Distribution<PolicyFamily>,
    implementation: Distribution<ImplementationBucket>,
    architecture: Distribution<Architecture>,
}

impl ReleaseWindow {
    fn new(members: &[&Tagged<'_>], implementations: &[ImplementationBucket]) -> Self {
        let packages = members.len() as u64;
        let x86_64: Vec<&Tagged<'_>> = members
            .iter()
            .copied()
            .filter(|m| m.tags.has_architecture(Architecture::X86_64))
            .collect();

        let mut highest = Distribution::with_total(x86_64.len() as u64);
        let mut lowest = Distribution::with_total(x86_64.len() as u64);
        for member in &x86_64 {
            let mut present = LEGACY_POLICIES
                .iter()
                .copied()
                .filter(|family| member.tags.has_policy(*family));
            // a package with only newer policies lands in neither ladder
            if let Some(oldest) = present.next() {
                lowest.add(oldest, 1);
                highest.add(present.last().unwrap_or(oldest), 1);
            }
        }

        let mut implementation = Distribution::with_total(packages);
        let mut architecture = Distribution::with_total(packages);
        for member in members {
            for bucket in implementations {
                if member.tags.has_implementation(*bucket) {
                    implementation.add(*bucket, 1);
                }
            }
            for arch in ARCHITECTURES {
                if member.tags.has_architecture(arch) {
                    architecture.add(arch, 1);
                }
            }
        }

        Self { highest, lowest, implementation, architecture }
    }
}

/// Compute the release-side document for the reporting dates `end, end - step, ...`
/// down to `start`.
pub fn compute(records: &[ReleaseRecord], opts: &ReleaseOptions, now: DateTime<Utc>) -> ReleaseReport {
    let first_day = opts.start - Duration::days(opts.window_days);
    let mut tagged: Vec<Tagged<'_>> = records
        .iter()
        .filter(|r| r.upload_day >= first_day && r.upload_day < opts.end)
        .map(|record| Tagged {
            record,
            tags: ReleaseTags::parse(&record.python_tags, &record.platform_tags),
        })
        .collect();
    tagged.sort_by(|a, b| b.record.upload_day.cmp(&a.record.upload_day));

    let package_count = tagged
        .iter()
        .map(|t| t.record.package.as_str())
        .collect::<HashSet<_>>()
        .len();

    let dates = reporting_dates(opts.start, opts.end, opts.step_days);
    let implementations = implementation_keys();
    let windows: Vec<ReleaseWindow> = snapshots(
        &tagged,
        &dates,
        opts.window_days,
        |t| t.record.upload_day,
        |t| t.record.package.as_str(),
    )
    .iter()
    .map(|snapshot| {
        debug!(end = %snapshot.window.end, packages = snapshot.members.len(), "release window");
        ReleaseWindow::new(&snapshot.members, &implementations)
    })
    .collect();
    info!(windows = windows.len(), packages = package_count, "computed release windows");

    ReleaseReport {
        last_update: last_update(now),
        package_count,
        index: iso_index(&dates),
        lowest_policy: policy_series(&windows, |w| &w.lowest),
        highest_policy: policy_series(&windows, |w| &w.highest),
        implementation: Series::build(&implementations, &windows, |w, bucket| {
            percent(w.implementation.share(bucket), 1)
        }),
        architecture: Series::build(&ARCHITECTURES, &windows, |w, arch| {
            percent(w.architecture.share(arch), 1)
        }),
    }
}

fn policy_series<F>(windows: &[ReleaseWindow], pick: F) -> Series
where
    F: Fn(&ReleaseWindow) -> &Distribution<PolicyFamily>,
{
    Series::build(&LEGACY_POLICIES, windows, |w, family| percent(pick(w).share(family), 1))
}
