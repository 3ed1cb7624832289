//! Plain-text rendering of panel data for the terminal driver.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::api::{CodeFrequencyPoint, CommitFrequency, Contributor, LanguageBytes, PullRequestCounts};
use crate::config::DisplayConfig;
use crate::stats::{self, ContributionHeatmap};
use crate::utils::datetime::{format_date, format_date_range, DateInput};

/// Heatmap glyphs by intensity level
const HEATMAP_GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];
const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn display_date(input: impl Into<DateInput>, display: &DisplayConfig) -> String {
    format_date(input, display.date_style, Some(display.custom_pattern.as_str()))
}

pub fn render_commits(data: &CommitFrequency, display: &DisplayConfig) -> String {
    let series = stats::commit_series(&data.commit_frequency);
    if series.is_empty() {
        return "No commit activity".to_string();
    }

    let mut out = String::new();
    if let (Some((first, _)), Some((last, _))) = (series.first(), series.last()) {
        let _ = writeln!(out, "Commits {}", format_date_range(*first, *last, display.date_style));
    }
    for (date, count) in &series {
        let _ = writeln!(out, "{:>20}  {}", display_date(*date, display), count);
    }
    let total: u64 = series.iter().map(|(_, count)| count).sum();
    let _ = write!(out, "{:>20}  {}", "Total", total);
    out
}

pub fn render_code_frequency(points: &[CodeFrequencyPoint], display: &DisplayConfig) -> String {
    if points.is_empty() {
        return "No code frequency data".to_string();
    }

    let mut out = String::new();
    for point in points {
        let _ = writeln!(
            out,
            "{:>20}  +{:<10} -{}",
            display_date(point.date.as_str(), display),
            point.additions.unsigned_abs(),
            point.deletions.unsigned_abs()
        );
    }
    let totals = stats::code_frequency_totals(points);
    let _ = write!(
        out,
        "{:>20}  +{:<10} -{} (net {})",
        "Total",
        totals.additions,
        totals.deletions,
        totals.net()
    );
    out
}

pub fn render_pull_requests(counts: &PullRequestCounts) -> String {
    format!(
        "Open: {}\nMerged: {}\nClosed (unmerged): {}\nTotal: {}",
        counts.open,
        counts.merged,
        counts.closed_unmerged,
        counts.total()
    )
}

pub fn render_contributors(contributors: &[Contributor]) -> String {
    if contributors.is_empty() {
        return "No contributors".to_string();
    }
    let mut sorted: Vec<&Contributor> = contributors.iter().collect();
    sorted.sort_by(|a, b| b.contributions.cmp(&a.contributions).then_with(|| a.login.cmp(&b.login)));

    sorted
        .iter()
        .map(|c| format!("{:<24} {}", c.login, c.contributions))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_languages(languages: &LanguageBytes) -> String {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return "No language data".to_string();
    }
    let mut sorted: Vec<(&String, &u64)> = languages.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    sorted
        .iter()
        .map(|(name, bytes)| format!("{:<16} {:>5.1}%", name, **bytes as f64 * 100.0 / total as f64))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contribution calendar for the most recent year in the data
pub fn render_heatmap(data: &CommitFrequency) -> String {
    let daily: BTreeMap<NaiveDate, u64> = stats::daily_counts(&data.commit_frequency);
    let Some(heatmap) = stats::available_years(&daily)
        .first()
        .and_then(|year| ContributionHeatmap::build(&daily, *year))
    else {
        return "No commit activity".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{} contributions in {}", heatmap.total, heatmap.year);
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        let row: String = (0..heatmap.weeks.len())
            .map(|week| match heatmap.cell(week, weekday) {
                Some(count) => HEATMAP_GLYPHS[heatmap.level(count) as usize],
                None => ' ',
            })
            .collect();
        let _ = writeln!(out, "{} {}", label, row);
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frequency(entries: &[(&str, u64)]) -> CommitFrequency {
        CommitFrequency {
            commit_frequency: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn commits_are_listed_in_date_order_with_total() {
        let data = frequency(&[("2024-01-14", 2), ("2024-01-07", 5)]);
        let out = render_commits(&data, &DisplayConfig::default());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Commits Jan 7, 2024 - Jan 14, 2024");
        assert!(lines[1].ends_with("Jan 7, 2024  5"));
        assert!(lines[2].ends_with("Jan 14, 2024  2"));
        assert!(lines[3].trim_start().starts_with("Total  7"));
    }

    #[test]
    fn languages_are_sorted_by_share() {
        let languages: LanguageBytes = [("Rust".to_string(), 750), ("Shell".to_string(), 250)].into_iter().collect();
        let out = render_languages(&languages);
        assert_eq!(out, "Rust              75.0%\nShell             25.0%");
    }

    #[test]
    fn empty_data_has_placeholder_text() {
        assert_eq!(render_commits(&CommitFrequency::default(), &DisplayConfig::default()), "No commit activity");
        assert_eq!(render_heatmap(&CommitFrequency::default()), "No commit activity");
        assert_eq!(render_languages(&LanguageBytes::new()), "No language data");
        assert_eq!(render_contributors(&[]), "No contributors");
    }

    #[test]
    fn heatmap_uses_latest_year() {
        let data = frequency(&[("2023-05-01", 1), ("2024-01-01", 4), ("2024-01-02", 1)]);
        let out = render_heatmap(&data);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "5 contributions in 2024");
        assert_eq!(lines.len(), 8);
        // Monday row: 2024-01-01 is the busiest day
        assert!(lines[2].starts_with("Mon █"));
        assert!(lines[3].starts_with("Tue ░"));
    }
}
