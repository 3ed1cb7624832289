//! Client-side shaping of stats payloads for charting.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::{CodeFrequencyPoint, Frequency};
use crate::utils::datetime::{self, format_ymd};

/// One week of GitHub commit activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    /// Week start (Sunday), Unix seconds
    pub week: i64,
    pub total: u64,
    /// Commits per day, Sunday first
    #[serde(default)]
    pub days: [u64; 7],
}

/// Bucket weekly activity into day, week or month totals keyed by `YYYY-MM-DD`.
///
/// Daily output only lists days with commits; monthly buckets are keyed by the
/// first of the month.
pub fn aggregate_commit_frequency(weeks: &[WeeklyActivity], frequency: Frequency) -> BTreeMap<String, u64> {
    let mut buckets = BTreeMap::new();

    for item in weeks {
        let Some(week_start) = DateTime::from_timestamp(item.week, 0).map(|dt| dt.date_naive()) else {
            warn!("Skipping activity week with invalid timestamp {}", item.week);
            continue;
        };

        match frequency {
            Frequency::Week => {
                buckets.insert(format_ymd(week_start), item.total);
            }
            Frequency::Day => {
                for (offset, &count) in item.days.iter().enumerate() {
                    if count == 0 {
                        continue;
                    }
                    if let Some(day) = week_start.checked_add_days(Days::new(offset as u64)) {
                        buckets.insert(format_ymd(day), count);
                    }
                }
            }
            Frequency::Month => {
                let month_start = week_start.with_day(1).unwrap_or(week_start);
                *buckets.entry(format_ymd(month_start)).or_insert(0) += item.total;
            }
        }
    }

    buckets
}

/// Parse a bucket key; keys are normally `YYYY-MM-DD` but any accepted date text works
fn parse_key(key: &str) -> Option<NaiveDate> {
    datetime::parse_ymd(key)
        .ok()
        .or_else(|| datetime::parse_date_text(key).ok().map(|dt| dt.date_naive()))
}

/// Date-sorted series from a frequency map; unparseable keys are dropped
pub fn commit_series(frequency: &BTreeMap<String, u64>) -> Vec<(NaiveDate, u64)> {
    let mut series: Vec<(NaiveDate, u64)> = frequency
        .iter()
        .filter_map(|(key, &count)| match parse_key(key) {
            Some(date) => Some((date, count)),
            None => {
                warn!("Dropping commit bucket with unparseable date '{}'", key);
                None
            }
        })
        .collect();
    series.sort_by_key(|(date, _)| *date);
    series
}

/// Daily counts by date, summing keys that resolve to the same day
pub fn daily_counts(frequency: &BTreeMap<String, u64>) -> BTreeMap<NaiveDate, u64> {
    let mut counts = BTreeMap::new();
    for (date, count) in commit_series(frequency) {
        *counts.entry(date).or_insert(0) += count;
    }
    counts
}

/// Summed code churn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeFrequencyTotals {
    pub additions: u64,
    pub deletions: u64,
}

impl CodeFrequencyTotals {
    /// Additions minus deletions, saturating at the `i64` bounds
    pub fn net(&self) -> i64 {
        let net = i128::from(self.additions) - i128::from(self.deletions);
        i64::try_from(net).unwrap_or(if net < 0 { i64::MIN } else { i64::MAX })
    }
}

pub fn code_frequency_totals(points: &[CodeFrequencyPoint]) -> CodeFrequencyTotals {
    points.iter().fold(CodeFrequencyTotals::default(), |acc, point| CodeFrequencyTotals {
        additions: acc.additions.saturating_add(point.additions.unsigned_abs()),
        deletions: acc.deletions.saturating_add(point.deletions.unsigned_abs()),
    })
}

/// Years with at least one day of data, newest first
pub fn available_years(daily: &BTreeMap<NaiveDate, u64>) -> Vec<i32> {
    let mut years: Vec<i32> = daily.keys().map(|d| d.year()).collect();
    years.dedup();
    years.reverse();
    years
}

/// One calendar year of daily counts laid out as Sunday-started week columns.
///
/// `weeks[w][d]` is the count for weekday `d` (0 = Sunday) of column `w`; days that
/// fall outside the year are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionHeatmap {
    pub year: i32,
    pub weeks: Vec<[Option<u64>; 7]>,
    pub max_count: u64,
    pub total: u64,
}

impl ContributionHeatmap {
    pub fn build(daily: &BTreeMap<NaiveDate, u64>, year: i32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
        let grid_start = first.checked_sub_days(Days::new(u64::from(first.weekday().num_days_from_sunday())))?;

        let mut weeks: Vec<[Option<u64>; 7]> = Vec::with_capacity(54);
        let mut max_count = 0;
        let mut total: u64 = 0;

        for date in grid_start.iter_days().take_while(|d| *d <= last) {
            let column = ((date - grid_start).num_days() / 7) as usize;
            if column == weeks.len() {
                weeks.push([None; 7]);
            }
            if date.year() != year {
                continue;
            }

            let count = daily.get(&date).copied().unwrap_or(0);
            weeks[column][date.weekday().num_days_from_sunday() as usize] = Some(count);
            max_count = max_count.max(count);
            total = total.saturating_add(count);
        }

        Some(Self {
            year,
            weeks,
            max_count,
            total,
        })
    }

    pub fn cell(&self, week: usize, weekday: usize) -> Option<u64> {
        self.weeks.get(week).and_then(|days| days.get(weekday).copied().flatten())
    }

    /// Intensity 0-4: 0 for no commits, otherwise the quartile of the year's maximum
    pub fn level(&self, count: u64) -> u8 {
        if count == 0 || self.max_count == 0 {
            return 0;
        }
        if count >= self.max_count {
            return 4;
        }
        let quartile = (u128::from(count) * 4).div_ceil(u128::from(self.max_count));
        quartile.clamp(1, 4) as u8
    }
}
