//! Day-granularity date helpers.
//!
//! Every date here is a `NaiveDate` interpreted as UTC midnight, so arithmetic is
//! plain day counting and never shifts with a local timezone or daylight saving.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open interval `[start, end_exclusive)` used to bucket daily values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end_exclusive: NaiveDate,
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end_exclusive
    }

    /// Inclusive last day of the window.
    pub fn last_day(&self) -> NaiveDate {
        add_days(self.end_exclusive, -1)
    }

    pub fn num_days(&self) -> i64 {
        (self.end_exclusive - self.start).num_days()
    }
}

/// Parses a strict `YYYY-MM-DD` string. Single-digit months or days, surrounding
/// whitespace and trailing time components are rejected.
pub fn parse_date_only(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_date_only(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Reads the calendar date of a stored value. Accepts RFC 3339 timestamps
/// (normalized to UTC), plain `YYYY-MM-DD`, and `YYYY-MM-DD HH:MM[:SS]` text.
pub fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    raw.get(..10).and_then(parse_date_only)
}

/// Every date from `start` to `end`, both inclusive. Empty when `start > end`.
pub fn list_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Consecutive 7-day windows anchored at `start`. The last window is cut short so
/// that it ends exactly at `end + 1 day`.
pub fn week_windows(start: NaiveDate, end: NaiveDate) -> Vec<Window> {
    if start > end {
        return Vec::new();
    }
    let range_end = add_days(end, 1);
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < range_end {
        let next = add_days(cursor, 7).min(range_end);
        windows.push(Window {
            start: cursor,
            end_exclusive: next,
        });
        cursor = next;
    }
    windows
}

/// One window per calendar month touched by `[start, end]`, clipped to the range.
pub fn month_windows(start: NaiveDate, end: NaiveDate) -> Vec<Window> {
    if start > end {
        return Vec::new();
    }
    let range_end = add_days(end, 1);
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < range_end {
        let Some(next_month) = first_of_next_month(cursor) else {
            break;
        };
        let next = next_month.min(range_end);
        windows.push(Window {
            start: cursor,
            end_exclusive: next,
        });
        cursor = next;
    }
    windows
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}
