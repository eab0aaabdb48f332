//! Reporting ranges derived from CLI dates and the current day.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::warn;

/// Default history covered when no start date is given.
pub const DEFAULT_WEEKS: i64 = 104;

/// Monday of the ISO week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Latest release reporting date: one week before the current week, so the
/// newest window has had time to collect uploads for every platform.
pub fn latest_release_end(today: NaiveDate) -> NaiveDate {
    week_start(today) - Duration::weeks(1)
}

/// Release reporting range, both ends aligned to their week's Monday.
pub fn release_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let latest = latest_release_end(today);
    let requested_end = end.unwrap_or(latest);
    let mut end = align("end", requested_end);
    if end > latest {
        warn!(requested = %requested_end, adjusted = %latest, "end date moved back to leave packagers time to upload wheels");
        end = latest;
    }
    let start = align("start", start.unwrap_or(end - Duration::weeks(DEFAULT_WEEKS)));
    if start >= end {
        bail!("start date {} is not before end date {}", start, end);
    }
    Ok((start, end))
}

/// Download reporting range `[start, end)`.
pub fn consumer_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - Duration::weeks(DEFAULT_WEEKS));
    if start >= end {
        bail!("start date {} is not before end date {}", start, end);
    }
    Ok((start, end))
}

fn align(which: &str, day: NaiveDate) -> NaiveDate {
    let aligned = week_start(day);
    if aligned != day {
        warn!(date = which, requested = %day, adjusted = %aligned, "date moved to the first day of its week");
    }
    aligned
}
