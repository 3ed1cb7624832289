//! Date and time utility functions
//!
//! This module converts, formats, compares and shifts date-like values for the
//! dashboard panels. Every public function here is total: invalid input and internal
//! failures are logged and turned into a sentinel (`"Invalid date"`, a zeroed
//! [`DateDifference`], `false`, `0`) instead of being propagated to the caller.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, TimeZone,
    Timelike, Utc,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{DATE_FORMAT_ERROR, INVALID_DATE};

/// Standard calendar date format used by the stats backend
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Zone-less date-time layouts accepted in text input, tried in order
const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts accepted in text input, tried in order.
/// Day-first wins over month-first for ambiguous slashed dates.
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Placeholder tokens understood by custom patterns
const PATTERN_TOKENS: &[&str] = &["yyyy", "MM", "dd", "HH", "mm", "ss"];

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;
const MILLIS_PER_DAY: u64 = 86_400_000;

/// Reasons a date-like value could not be turned into an instant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("empty date input")]
    Empty,

    #[error("unparsable date string '{0}'")]
    Unparsable(String),

    #[error("epoch milliseconds out of range: {0}")]
    OutOfRange(i64),

    #[error("failed to render date with format '{0}'")]
    Format(String),

    #[error("date arithmetic overflowed")]
    Overflow,
}

/// A point in time in one of the shapes the dashboard receives it
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// ISO-8601, RFC 2822 or one of the backend's calendar formats
    Text(String),
    /// Milliseconds since the Unix epoch
    EpochMillis(i64),
    /// An already-resolved instant
    Instant(DateTime<Local>),
    /// A missing value
    Empty,
}

impl DateInput {
    /// Resolve the input to a local instant
    pub fn to_instant(&self) -> Result<DateTime<Local>, DateError> {
        match self {
            DateInput::Text(text) => parse_date_text(text),
            DateInput::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
                .map(|utc| utc.with_timezone(&Local))
                .ok_or(DateError::OutOfRange(*ms)),
            DateInput::Instant(dt) => Ok(*dt),
            DateInput::Empty => Err(DateError::Empty),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<&String> for DateInput {
    fn from(value: &String) -> Self {
        DateInput::Text(value.clone())
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        DateInput::EpochMillis(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        DateInput::Instant(value.with_timezone(&Local))
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Instant(localize_earliest(value.and_time(NaiveTime::MIN)))
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Instant(localize_earliest(value))
    }
}

impl From<&DateInput> for DateInput {
    fn from(value: &DateInput) -> Self {
        value.clone()
    }
}

impl<T: Into<DateInput>> From<Option<T>> for DateInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(DateInput::Empty, Into::into)
    }
}

/// Named output styles for [`format_date`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `Jan 5`
    Short,
    /// `Jan 5, 2024`
    #[default]
    Medium,
    /// `January 5, 2024`
    Long,
    /// `Friday, January 5, 2024`
    Full,
    /// `01/05/2024`
    Numeric,
    /// Placeholder pattern, or the full machine-readable instant without one
    Custom,
}

impl FromStr for DateStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(DateStyle::Short),
            "medium" => Ok(DateStyle::Medium),
            "long" => Ok(DateStyle::Long),
            "full" => Ok(DateStyle::Full),
            "numeric" => Ok(DateStyle::Numeric),
            "custom" => Ok(DateStyle::Custom),
            other => Err(format!("unknown date style '{}'", other)),
        }
    }
}

/// Calendar periods understood by [`get_time_period`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(TimePeriod::Day),
            "week" => Ok(TimePeriod::Week),
            "month" => Ok(TimePeriod::Month),
            "quarter" => Ok(TimePeriod::Quarter),
            "year" => Ok(TimePeriod::Year),
            other => Err(format!("unknown time period '{}'", other)),
        }
    }
}

/// Granularity used by [`compare_dates`]; finer components are truncated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Precision {
    Year,
    Month,
    #[default]
    Day,
    Hour,
    Minute,
    Second,
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(Precision::Year),
            "month" => Ok(Precision::Month),
            "day" => Ok(Precision::Day),
            "hour" => Ok(Precision::Hour),
            "minute" => Ok(Precision::Minute),
            "second" => Ok(Precision::Second),
            other => Err(format!("unknown precision '{}'", other)),
        }
    }
}

/// Units accepted by [`add_to_date`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "years" | "year" => Ok(TimeUnit::Years),
            "months" | "month" => Ok(TimeUnit::Months),
            "weeks" | "week" => Ok(TimeUnit::Weeks),
            "days" | "day" => Ok(TimeUnit::Days),
            "hours" | "hour" => Ok(TimeUnit::Hours),
            "minutes" | "minute" => Ok(TimeUnit::Minutes),
            "seconds" | "second" => Ok(TimeUnit::Seconds),
            other => Err(format!("unknown time unit '{}'", other)),
        }
    }
}

/// Start and end instants of a calendar period.
///
/// `start` is at 00:00:00.000 and `end` at 23:59:59.999 local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePeriodRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl TimePeriodRange {
    /// Whether `instant` falls inside the range, bounds included
    pub fn contains(&self, instant: &DateTime<Local>) -> bool {
        *instant >= self.start && *instant <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn num_days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }
}

/// Elapsed time between two instants, always non-negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDifference {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    /// Whole days in the raw millisecond delta
    pub total_days: u64,
}

/// Parse a `YYYY-MM-DD` string to a NaiveDate
pub fn parse_ymd(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, ISO_DATE_FORMAT)
}

/// Format a NaiveDate to a `YYYY-MM-DD` string
pub fn format_ymd(d: NaiveDate) -> String {
    d.format(ISO_DATE_FORMAT).to_string()
}

/// Parse free-form date text into a local instant.
///
/// Text without an offset is read as local time; date-only text as local midnight.
pub fn parse_date_text(text: &str) -> Result<DateTime<Local>, DateError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Local));
    }

    for format in TEXT_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(localize_earliest(ndt));
        }
    }

    for format in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(localize_earliest(date.and_time(NaiveTime::MIN)));
        }
    }

    // Year-month only, e.g. "2024-03"
    if text.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", text), ISO_DATE_FORMAT) {
            return Ok(localize_earliest(date.and_time(NaiveTime::MIN)));
        }
    }

    Err(DateError::Unparsable(text.to_string()))
}

/// Format a date under a named style.
///
/// Returns `"Invalid date"` for input that does not resolve to an instant and
/// `"Error formatting date"` if rendering itself fails.
pub fn format_date(input: impl Into<DateInput>, style: DateStyle, custom_pattern: Option<&str>) -> String {
    let input = input.into();
    let instant = match input.to_instant() {
        Ok(dt) => dt,
        Err(e) => {
            warn!("format_date: {} ({:?})", e, input);
            return INVALID_DATE.to_string();
        }
    };

    match render_style(&instant, style, custom_pattern) {
        Ok(formatted) => formatted,
        Err(e) => {
            error!("format_date: {}", e);
            DATE_FORMAT_ERROR.to_string()
        }
    }
}

fn render_style(instant: &DateTime<Local>, style: DateStyle, custom_pattern: Option<&str>) -> Result<String, DateError> {
    match style {
        DateStyle::Short => render(instant, "%b %-d"),
        DateStyle::Medium => render(instant, "%b %-d, %Y"),
        DateStyle::Long => render(instant, "%B %-d, %Y"),
        DateStyle::Full => render(instant, "%A, %B %-d, %Y"),
        DateStyle::Numeric => render(instant, "%m/%d/%Y"),
        DateStyle::Custom => match custom_pattern {
            Some(pattern) => Ok(apply_pattern(instant, pattern)),
            None => Ok(instant.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true)),
        },
    }
}

/// Render with a strftime format, surfacing format failures instead of panicking
fn render<Tz>(instant: &DateTime<Tz>, format: &str) -> Result<String, DateError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", instant.format(format)).map_err(|_| DateError::Format(format.to_string()))?;
    Ok(out)
}

/// Substitute `yyyy`, `MM`, `dd`, `HH`, `mm`, `ss`; everything else is copied verbatim
fn apply_pattern(instant: &DateTime<Local>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut rest = pattern;

    'outer: while !rest.is_empty() {
        for token in PATTERN_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                let _ = match *token {
                    "yyyy" => write!(out, "{:04}", instant.year()),
                    "MM" => write!(out, "{:02}", instant.month()),
                    "dd" => write!(out, "{:02}", instant.day()),
                    "HH" => write!(out, "{:02}", instant.hour()),
                    "mm" => write!(out, "{:02}", instant.minute()),
                    _ => write!(out, "{:02}", instant.second()),
                };
                rest = tail;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

/// Describe how long ago `input` was, relative to the current time
pub fn format_relative_time(input: impl Into<DateInput>) -> String {
    format_relative_time_from(input, Local::now())
}

/// Describe how long ago `input` was, relative to `now`.
///
/// Months are 30 days and years 365 days. Instants after `now` read "in N units".
pub fn format_relative_time_from(input: impl Into<DateInput>, now: DateTime<Local>) -> String {
    let input = input.into();
    match input.to_instant() {
        Ok(instant) => relative_phrase((now - instant).num_seconds()),
        Err(e) => {
            warn!("format_relative_time: {} ({:?})", e, input);
            INVALID_DATE.to_string()
        }
    }
}

fn relative_phrase(elapsed_seconds: i64) -> String {
    let future = elapsed_seconds < 0;
    let secs = elapsed_seconds.unsigned_abs();

    if secs < 30 {
        return "just now".to_string();
    }

    let days = secs / SECONDS_PER_DAY;
    let (value, unit) = if secs < SECONDS_PER_MINUTE {
        (secs, "second")
    } else if secs < SECONDS_PER_HOUR {
        (secs / SECONDS_PER_MINUTE, "minute")
    } else if secs < SECONDS_PER_DAY {
        (secs / SECONDS_PER_HOUR, "hour")
    } else if days < 7 {
        (days, "day")
    } else if days < 30 {
        (days / 7, "week")
    } else if days < 365 {
        (days / 30, "month")
    } else {
        (days / 365, "year")
    };

    let plural = if value == 1 { "" } else { "s" };
    if future {
        format!("in {} {}{}", value, unit, plural)
    } else {
        format!("{} {}{} ago", value, unit, plural)
    }
}

/// Format the time of day, e.g. `02:30 PM` or `02:30:45 PM`
pub fn format_time(input: impl Into<DateInput>, include_seconds: bool) -> String {
    let input = input.into();
    let instant = match input.to_instant() {
        Ok(dt) => dt,
        Err(e) => {
            warn!("format_time: {} ({:?})", e, input);
            return INVALID_DATE.to_string();
        }
    };

    let format = if include_seconds { "%I:%M:%S %p" } else { "%I:%M %p" };
    render(&instant, format).unwrap_or_else(|e| {
        error!("format_time: {}", e);
        DATE_FORMAT_ERROR.to_string()
    })
}

/// Bounds of the calendar period containing the current time
pub fn current_time_period(period: TimePeriod) -> TimePeriodRange {
    get_time_period(period, Local::now())
}

/// Bounds of the calendar period containing `reference`.
///
/// Weeks run Sunday to Saturday; quarters are Jan-Mar, Apr-Jun, Jul-Sep and Oct-Dec.
pub fn get_time_period(period: TimePeriod, reference: DateTime<Local>) -> TimePeriodRange {
    let date = reference.date_naive();

    let (first, last) = match period {
        TimePeriod::Day => (date, date),
        TimePeriod::Week => {
            let offset = u64::from(date.weekday().num_days_from_sunday());
            let start = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
            (start, start.checked_add_days(Days::new(6)).unwrap_or(start))
        }
        TimePeriod::Month => (first_of_month(date), last_of_month(date)),
        TimePeriod::Quarter => {
            let start_month = (date.month0() / 3) * 3 + 1;
            let start = first_of_month(date).with_month(start_month).unwrap_or(date);
            let end = start.checked_add_months(Months::new(2)).map(last_of_month).unwrap_or(date);
            (start, end)
        }
        TimePeriod::Year => (
            NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
            NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
        ),
    };

    TimePeriodRange {
        start: start_of_day(first),
        end: end_of_day(last),
    }
}

/// Compare `a` with the current time; see [`compare_dates`]
pub fn compare_to_now(a: impl Into<DateInput>, precision: Precision) -> i64 {
    compare_dates(a, Local::now(), precision)
}

/// Signed difference `a - b` in milliseconds after truncating both to `precision`.
///
/// Negative when `a` is earlier, zero when equal at that precision. Invalid input on
/// either side yields `0`.
pub fn compare_dates(a: impl Into<DateInput>, b: impl Into<DateInput>, precision: Precision) -> i64 {
    let (a, b) = (a.into(), b.into());
    match (a.to_instant(), b.to_instant()) {
        (Ok(a), Ok(b)) => (truncate(&a, precision) - truncate(&b, precision)).num_milliseconds(),
        (Err(e), _) | (_, Err(e)) => {
            warn!("compare_dates: {} ({:?} vs {:?})", e, a, b);
            0
        }
    }
}

fn truncate(instant: &DateTime<Local>, precision: Precision) -> NaiveDateTime {
    let naive = instant.naive_local();
    let date = naive.date();

    let truncated = match precision {
        Precision::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).map(|d| d.and_time(NaiveTime::MIN)),
        Precision::Month => date.with_day(1).map(|d| d.and_time(NaiveTime::MIN)),
        Precision::Day => Some(date.and_time(NaiveTime::MIN)),
        Precision::Hour => naive
            .with_minute(0)
            .and_then(|n| n.with_second(0))
            .and_then(|n| n.with_nanosecond(0)),
        Precision::Minute => naive.with_second(0).and_then(|n| n.with_nanosecond(0)),
        Precision::Second => naive.with_nanosecond(0),
    };

    truncated.unwrap_or(naive)
}

/// Format a start/end pair; a range within one calendar day collapses to one date
pub fn format_date_range(start: impl Into<DateInput>, end: impl Into<DateInput>, style: DateStyle) -> String {
    let (start, end) = (start.into(), end.into());
    let (start_dt, end_dt) = match (start.to_instant(), end.to_instant()) {
        (Ok(s), Ok(e)) => (s, e),
        (Err(e), _) | (_, Err(e)) => {
            warn!("format_date_range: {} ({:?} - {:?})", e, start, end);
            return INVALID_DATE.to_string();
        }
    };

    let start_str = format_date(start_dt, style, None);
    if start_dt.date_naive() == end_dt.date_naive() {
        return start_str;
    }
    format!("{} - {}", start_str, format_date(end_dt, style, None))
}

/// Elapsed time between `start` and the current time
pub fn date_difference_from_now(start: impl Into<DateInput>) -> DateDifference {
    get_date_difference(start, Local::now())
}

/// Calendar-aware difference between two instants.
///
/// The earlier instant is always treated as the start, so argument order does not
/// matter. Years, months and days follow the calendar (a month step from the 31st
/// lands on the last day of a shorter month); hours, minutes and seconds are the
/// remainders of the raw delta. Invalid input yields an all-zero difference.
pub fn get_date_difference(start: impl Into<DateInput>, end: impl Into<DateInput>) -> DateDifference {
    let (start, end) = (start.into(), end.into());
    let (a, b) = match (start.to_instant(), end.to_instant()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            warn!("get_date_difference: {} ({:?} - {:?})", e, start, end);
            return DateDifference::default();
        }
    };
    let (from, to) = if a <= b { (a, b) } else { (b, a) };

    let delta_ms = u64::try_from((to - from).num_milliseconds()).unwrap_or(0);
    let delta_secs = delta_ms / 1000;
    let (years, months, days) = calendar_span(from.naive_local(), to.naive_local());

    DateDifference {
        years,
        months,
        days,
        hours: ((delta_secs / SECONDS_PER_HOUR) % 24) as u32,
        minutes: ((delta_secs / SECONDS_PER_MINUTE) % 60) as u32,
        seconds: (delta_secs % 60) as u32,
        total_days: delta_ms / MILLIS_PER_DAY,
    }
}

/// Whole years, months and days from `from` to `to` (`from <= to`)
fn calendar_span(from: NaiveDateTime, to: NaiveDateTime) -> (u32, u32, u32) {
    let start = from.date();
    let mut end = to.date();
    // An unfinished last day does not count
    if to.time() < from.time() && end > start {
        end = end.pred_opt().unwrap_or(end);
    }

    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut anchor = add_months(start, months);
    while months > 0 && anchor.map_or(true, |a| a > end) {
        months -= 1;
        anchor = add_months(start, months);
    }
    let months = months.max(0) as u32;
    let days = (end - anchor.unwrap_or(start)).num_days().max(0) as u32;

    (months / 12, months % 12, days)
}

fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    u32::try_from(months).ok().and_then(|m| date.checked_add_months(Months::new(m)))
}

/// Shift `base` by `amount` units.
///
/// Month and year steps clamp to the end of shorter months; day and week steps keep
/// the wall-clock time. An invalid base yields the current instant, and an
/// out-of-range result leaves the base unchanged.
pub fn add_to_date(base: impl Into<DateInput>, amount: i64, unit: TimeUnit) -> DateTime<Local> {
    let base = base.into();
    let instant = match base.to_instant() {
        Ok(dt) => dt,
        Err(e) => {
            warn!("add_to_date: {} ({:?}), substituting current time", e, base);
            return Local::now();
        }
    };

    shift(instant, amount, unit).unwrap_or_else(|e| {
        error!("add_to_date: {} ({} {:?} from {})", e, amount, unit, instant);
        instant
    })
}

fn shift(instant: DateTime<Local>, amount: i64, unit: TimeUnit) -> Result<DateTime<Local>, DateError> {
    let naive = instant.naive_local();
    match unit {
        TimeUnit::Years => shift_months(naive, amount.checked_mul(12).ok_or(DateError::Overflow)?),
        TimeUnit::Months => shift_months(naive, amount),
        TimeUnit::Weeks => shift_days(naive, amount.checked_mul(7).ok_or(DateError::Overflow)?),
        TimeUnit::Days => shift_days(naive, amount),
        TimeUnit::Hours => shift_exact(instant, TimeDelta::try_hours(amount)),
        TimeUnit::Minutes => shift_exact(instant, TimeDelta::try_minutes(amount)),
        TimeUnit::Seconds => shift_exact(instant, TimeDelta::try_seconds(amount)),
    }
}

fn shift_months(naive: NaiveDateTime, months: i64) -> Result<DateTime<Local>, DateError> {
    let step = Months::new(u32::try_from(months.unsigned_abs()).map_err(|_| DateError::Overflow)?);
    let shifted = if months >= 0 {
        naive.checked_add_months(step)
    } else {
        naive.checked_sub_months(step)
    };
    shifted.map(localize_earliest).ok_or(DateError::Overflow)
}

fn shift_days(naive: NaiveDateTime, days: i64) -> Result<DateTime<Local>, DateError> {
    let step = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        naive.checked_add_days(step)
    } else {
        naive.checked_sub_days(step)
    };
    shifted.map(localize_earliest).ok_or(DateError::Overflow)
}

fn shift_exact(instant: DateTime<Local>, delta: Option<TimeDelta>) -> Result<DateTime<Local>, DateError> {
    delta
        .and_then(|d| instant.checked_add_signed(d))
        .ok_or(DateError::Overflow)
}

/// ISO-8601 rendering.
///
/// * `include_time = false`: the UTC calendar date, `YYYY-MM-DD`
/// * `include_timezone = false`: UTC `YYYY-MM-DDTHH:MM:SS`
/// * both: UTC `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn format_iso_date(input: impl Into<DateInput>, include_time: bool, include_timezone: bool) -> String {
    let input = input.into();
    let instant = match input.to_instant() {
        Ok(dt) => dt,
        Err(e) => {
            warn!("format_iso_date: {} ({:?})", e, input);
            return INVALID_DATE.to_string();
        }
    };

    let utc = instant.with_timezone(&Utc);
    if !include_time {
        return format_ymd(utc.date_naive());
    }

    if include_timezone {
        utc.to_rfc3339_opts(SecondsFormat::Millis, true)
    } else {
        render(&utc, "%Y-%m-%dT%H:%M:%S").unwrap_or_else(|e| {
            error!("format_iso_date: {}", e);
            DATE_FORMAT_ERROR.to_string()
        })
    }
}

/// Whether `input` lies between `start` and `end`; any invalid value yields `false`
pub fn is_date_in_range(
    input: impl Into<DateInput>,
    start: impl Into<DateInput>,
    end: impl Into<DateInput>,
    inclusive: bool,
) -> bool {
    let (input, start, end) = (input.into(), start.into(), end.into());
    match (input.to_instant(), start.to_instant(), end.to_instant()) {
        (Ok(x), Ok(s), Ok(e)) => {
            if inclusive {
                x >= s && x <= e
            } else {
                x > s && x < e
            }
        }
        _ => {
            warn!("is_date_in_range: invalid input ({:?} in {:?}..{:?})", input, start, end);
            false
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    localize_earliest(date.and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Local> {
    let naive = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    Local
        .from_local_datetime(&naive)
        .latest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Resolve a wall-clock time, taking the earlier reading on DST folds
fn localize_earliest(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}
