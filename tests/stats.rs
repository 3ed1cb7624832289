use std::collections::BTreeMap;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use repostats::api::{CodeFrequencyPoint, Frequency};
use repostats::stats::*;

// Sunday 2024-01-07 00:00 UTC
const WEEK_JAN_07: i64 = 1_704_585_600;
const WEEK: i64 = 7 * 86_400;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn activity() -> Vec<WeeklyActivity> {
    vec![
        WeeklyActivity {
            week: WEEK_JAN_07,
            total: 3,
            days: [0, 2, 0, 0, 1, 0, 0],
        },
        WeeklyActivity {
            week: WEEK_JAN_07 + 3 * WEEK,
            total: 5,
            days: [1, 1, 1, 1, 1, 0, 0],
        },
        WeeklyActivity {
            week: WEEK_JAN_07 + 4 * WEEK,
            total: 4,
            days: [0, 0, 0, 0, 0, 0, 4],
        },
    ]
}

#[test]
fn test_weekly_buckets_keep_week_start() {
    let buckets = aggregate_commit_frequency(&activity(), Frequency::Week);
    let expected: BTreeMap<String, u64> = [("2024-01-07", 3), ("2024-01-28", 5), ("2024-02-04", 4)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(buckets, expected);
}

#[test]
fn test_daily_buckets_skip_empty_days() {
    let buckets = aggregate_commit_frequency(&activity()[..1], Frequency::Day);
    let expected: BTreeMap<String, u64> = [("2024-01-08", 2), ("2024-01-11", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(buckets, expected);
}

#[test]
fn test_monthly_buckets_sum_by_week_start_month() {
    let buckets = aggregate_commit_frequency(&activity(), Frequency::Month);
    assert_eq!(buckets.get("2024-01-01"), Some(&8));
    assert_eq!(buckets.get("2024-02-01"), Some(&4));
    assert_eq!(buckets.len(), 2);
}

#[test]
fn test_weekly_activity_deserializes_github_shape() {
    let json = r#"[{"week":1704585600,"total":3,"days":[0,2,0,0,1,0,0]}]"#;
    let weeks: Vec<WeeklyActivity> = serde_json::from_str(json).unwrap();
    assert_eq!(weeks, activity()[..1].to_vec());
}

#[test]
fn test_commit_series_is_sorted_and_drops_bad_keys() {
    let mut frequency = BTreeMap::new();
    frequency.insert("2024-03-01".to_string(), 2);
    frequency.insert("2024/02/01".to_string(), 5);
    frequency.insert("not a date".to_string(), 9);

    let series = commit_series(&frequency);
    assert_eq!(series, vec![(date(2024, 2, 1), 5), (date(2024, 3, 1), 2)]);
}

#[test]
fn test_code_frequency_totals_use_magnitudes() {
    let points = vec![
        CodeFrequencyPoint {
            date: "2024-01-07".to_string(),
            additions: 120,
            deletions: -30,
        },
        CodeFrequencyPoint {
            date: "2024-01-14".to_string(),
            additions: 10,
            deletions: -200,
        },
    ];
    let totals = code_frequency_totals(&points);
    assert_eq!(totals.additions, 130);
    assert_eq!(totals.deletions, 230);
    assert_eq!(totals.net(), -100);
}

#[test]
fn test_available_years_newest_first() {
    let daily: BTreeMap<NaiveDate, u64> = [(date(2022, 5, 1), 1), (date(2024, 1, 3), 2), (date(2024, 6, 3), 1)]
        .into_iter()
        .collect();
    assert_eq!(available_years(&daily), vec![2024, 2022]);
}

#[test]
fn test_heatmap_layout_for_leap_year() {
    let daily: BTreeMap<NaiveDate, u64> = [(date(2024, 1, 1), 2), (date(2024, 12, 31), 8), (date(2023, 12, 31), 50)]
        .into_iter()
        .collect();
    let heatmap = ContributionHeatmap::build(&daily, 2024).unwrap();

    // 2024-01-01 is a Monday; the first column starts on Sunday 2023-12-31
    assert_eq!(heatmap.weeks.len(), 53);
    assert_eq!(heatmap.cell(0, 0), None);
    assert_eq!(heatmap.cell(0, 1), Some(2));
    assert_eq!(heatmap.cell(0, 2), Some(0));

    // 2024-12-31 is a Tuesday in the last column
    assert_eq!(heatmap.cell(52, 2), Some(8));
    assert_eq!(heatmap.cell(52, 3), None);
    assert_eq!(heatmap.cell(60, 0), None);

    // Days outside the year are not counted
    assert_eq!(heatmap.total, 10);
    assert_eq!(heatmap.max_count, 8);
    assert_eq!(heatmap.level(8), 4);
    assert_eq!(heatmap.level(2), 1);
}
