use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::aggregate::round_to;
use super::fields::StatField;
use super::scanner::DateRangeScanner;
use crate::dates::{self, format_date_only, Window};
use crate::db::{DocumentStore, StoreError, DAY_ENTRIES};
use crate::models::day_entry::DayEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Daily,
    Weekly,
    Monthly,
}

impl Aggregate {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(Aggregate::Daily),
            "weekly" => Some(Aggregate::Weekly),
            "monthly" => Some(Aggregate::Monthly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Daily => "daily",
            Aggregate::Weekly => "weekly",
            Aggregate::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DayTotal {
    sum: f64,
    count: u32,
}

/// Per-date running sum and document count for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyValues {
    days: BTreeMap<NaiveDate, DayTotal>,
}

impl DailyValues {
    pub fn add(&mut self, date: NaiveDate, value: f64) {
        let day = self.days.entry(date).or_default();
        day.sum += value;
        day.count += 1;
    }

    /// Average for the date; `None` when nothing contributed.
    pub fn average(&self, date: NaiveDate) -> Option<f64> {
        self.days
            .get(&date)
            .filter(|d| d.count > 0)
            .map(|d| d.sum / d.count as f64)
    }

    /// Dates with at least one contributing document.
    pub fn contributing_days(&self) -> usize {
        self.days.values().filter(|d| d.count > 0).count()
    }

    /// Window average taken over the raw per-day sums and counts, not over the
    /// per-day averages. Returns the average and the number of contributing days.
    pub fn window_average(&self, window: &Window) -> (Option<f64>, u32) {
        let (sum, docs, days) = self
            .days
            .range(window.start..window.end_exclusive)
            .filter(|(_, d)| d.count > 0)
            .fold((0.0, 0u32, 0u32), |(sum, docs, days), (_, d)| {
                (sum + d.sum, docs + d.count, days + 1)
            });
        let value = (docs > 0).then(|| sum / docs as f64);
        (value, days)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoint {
    Day {
        date: String,
        value: Option<f64>,
    },
    Window {
        start: String,
        /// Inclusive last day
        end: String,
        value: Option<f64>,
        count: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub date: String,
    pub note: String,
}

/// Scans `[start, end]` once and accumulates the field's values per date.
pub async fn collect_daily_values(
    store: &dyn DocumentStore,
    field: StatField,
    start: NaiveDate,
    end: NaiveDate,
    page_size: u32,
) -> Result<DailyValues, StoreError> {
    let mut daily = DailyValues::default();
    DateRangeScanner::new(store, DAY_ENTRIES, start, end, page_size)
        .for_each(|entry: DayEntry| {
            if let Some(value) = entry.numeric_value(field) {
                daily.add(entry.date, value);
            }
        })
        .await?;
    Ok(daily)
}

/// Tracker-block notes for the field, in ascending date order.
pub async fn collect_notes(
    store: &dyn DocumentStore,
    field: StatField,
    start: NaiveDate,
    end: NaiveDate,
    page_size: u32,
) -> Result<Vec<NoteEntry>, StoreError> {
    let scanner = DateRangeScanner::new(store, DAY_ENTRIES, start, end, page_size);
    scanner
        .collect(|entry: &DayEntry| {
            entry.tracker_note(field).map(|note| NoteEntry {
                date: format_date_only(entry.date),
                note: note.to_string(),
            })
        })
        .await
}

/// Buckets per-day values into contiguous windows covering `[start, end]`.
/// An empty series comes back when `start > end`.
pub fn build_series(
    daily: &DailyValues,
    aggregate: Aggregate,
    field: StatField,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<SeriesPoint> {
    let precision = field.precision();
    let windows = match aggregate {
        Aggregate::Daily => {
            return dates::list_dates(start, end)
                .into_iter()
                .map(|date| SeriesPoint::Day {
                    date: format_date_only(date),
                    value: daily.average(date).map(|v| round_to(v, precision)),
                })
                .collect();
        }
        Aggregate::Weekly => dates::week_windows(start, end),
        Aggregate::Monthly => dates::month_windows(start, end),
    };

    windows
        .iter()
        .map(|window| {
            let (value, count) = daily.window_average(window);
            SeriesPoint::Window {
                start: format_date_only(window.start),
                end: format_date_only(window.last_day()),
                value: value.map(|v| round_to(v, precision)),
                count,
            }
        })
        .collect()
}
