//! # Lifelog — Request/Response DTOs
//!
//! Query-string shapes accepted by the stats endpoints and the JSON bodies they
//! return.
//!
//! Conventions:
//! - `*Query`    → deserialized from query params, every field optional so that
//!   missing values become structured 400s instead of extractor rejections
//! - `*Response` → serialized to client JSON, camelCase keys

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::{format_date_only, parse_date_only};
use crate::error::AppError;
use crate::models::dive::AdjacentDive;
use crate::stats::aggregate::{Consistency, Distribution, MinMax};
use crate::stats::fields::{StatField, UnknownField};
use crate::stats::series::{Aggregate, NoteEntry, SeriesPoint};

// ============================================================================
// Day-entry statistics
// ============================================================================

/// GET /api/day-entries/stats*
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub field: Option<String>,
}

/// GET /api/day-entries/series*
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub field: Option<String>,
    /// "daily" | "weekly" | "monthly". Default: "daily"
    pub aggregate: Option<String>,
}

/// A validated date range plus canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub field: StatField,
}

/// GET /api/day-entries/stats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub count: usize,
    pub average: Option<f64>,
    pub median: Option<f64>,
    /// Only for fields with a fixed range (mood, diving)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    pub consistency: Consistency,
    pub minmax: MinMax,
}

/// GET /api/day-entries/stats/average
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageResponse {
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub count: usize,
    pub average: Option<f64>,
    pub median: Option<f64>,
}

/// GET /api/day-entries/stats/consistency
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyResponse {
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub count: usize,
    #[serde(flatten)]
    pub consistency: Consistency,
}

/// GET /api/day-entries/stats/distribution
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub total_count: u64,
    pub distribution: Distribution,
}

/// GET /api/day-entries/series
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub aggregate: Aggregate,
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub series: Vec<SeriesPoint>,
    /// Number of entries in `series`
    pub count: usize,
}

/// GET /api/day-entries/series/notes
#[derive(Debug, Serialize)]
pub struct NotesResponse {
    /// Always "notes"
    pub aggregate: &'static str,
    pub field: StatField,
    pub start: String,
    pub end: String,
    pub notes: Vec<NoteEntry>,
    pub count: usize,
}

// ============================================================================
// Dive log
// ============================================================================

/// GET /api/garmin-dives/search
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveSearchQuery {
    pub q: Option<String>,
    pub dive_type: Option<String>,
    /// Default: 1
    pub page: Option<String>,
    /// Default: 7
    pub limit: Option<String>,
}

/// Count and share of dives in one category.
#[derive(Debug, Serialize)]
pub struct DiveShare {
    pub count: u64,
    /// One decimal, e.g. "42.9"
    pub percentage: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateDives {
    pub intermediate_dives_start_meters: u32,
    #[serde(flatten)]
    pub share: DiveShare,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDives {
    pub deep_dive_cutoff_meters: u32,
    #[serde(flatten)]
    pub share: DiveShare,
}

/// GET /api/garmin-dives/basic-stats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveBasicStatsResponse {
    pub total_dives: u64,
    pub deepest_depth_meters: String,
    pub total_bottom_time_seconds: String,
    pub instructing_dives: DiveShare,
    pub recreational_dives: DiveShare,
    pub intermediate_dives: IntermediateDives,
    pub deep_dives: DeepDives,
}

/// GET /api/garmin-dives/by-date-time/:dateTime — the stored dive plus neighbours
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveWithAdjacentResponse {
    #[serde(flatten)]
    pub dive: serde_json::Map<String, Value>,
    /// The next dive after this one in time
    pub previous_dive: Option<AdjacentDive>,
    /// The dive before this one in time
    pub next_dive: Option<AdjacentDive>,
}

// ============================================================================
// Validation helpers
// ============================================================================

const MISSING_RANGE: &str =
    r#"Query parameters "start" and "end" are required (format: YYYY-MM-DD)"#;

impl StatsQuery {
    /// `start`/`end` present and strict `YYYY-MM-DD`; `field` a known stat field.
    pub fn validate(&self) -> Result<StatsParams, AppError> {
        validate_stats_params(
            self.start.as_deref(),
            self.end.as_deref(),
            self.field.as_deref(),
        )
    }
}

impl SeriesQuery {
    pub fn validate(&self) -> Result<(StatsParams, Aggregate), AppError> {
        let params = validate_stats_params(
            self.start.as_deref(),
            self.end.as_deref(),
            self.field.as_deref(),
        )?;
        let aggregate = match self.aggregate.as_deref() {
            None | Some("") => Aggregate::Daily,
            Some(raw) => Aggregate::parse(raw).ok_or_else(|| {
                AppError::Validation(
                    "Invalid aggregate parameter. Allowed values: daily, weekly, monthly".into(),
                )
            })?,
        };
        Ok((params, aggregate))
    }
}

pub fn validate_stats_params(
    start: Option<&str>,
    end: Option<&str>,
    field: Option<&str>,
) -> Result<StatsParams, AppError> {
    let (Some(start), Some(end)) = (non_empty(start), non_empty(end)) else {
        return Err(AppError::Validation(MISSING_RANGE.into()));
    };
    let start = parse_query_date("start", start)?;
    let end = parse_query_date("end", end)?;
    let field = field
        .and_then(StatField::normalize)
        .ok_or_else(|| AppError::Validation(UnknownField.to_string()))?;
    Ok(StatsParams { start, end, field })
}

impl StatsParams {
    pub fn start_str(&self) -> String {
        format_date_only(self.start)
    }

    pub fn end_str(&self) -> String {
        format_date_only(self.end)
    }

    /// Rejects fields without a fixed histogram range.
    pub fn require_distribution(&self) -> Result<(), AppError> {
        if self.field.supports_distribution() {
            Ok(())
        } else {
            Err(AppError::Validation(
                "Distribution endpoint only supports mood and diving fields".into(),
            ))
        }
    }
}

impl DiveSearchQuery {
    pub const DEFAULT_LIMIT: u32 = 7;

    pub fn page(&self) -> u32 {
        parse_positive(self.page.as_deref(), 1)
    }

    pub fn limit(&self) -> u32 {
        parse_positive(self.limit.as_deref(), Self::DEFAULT_LIMIT)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_query_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_date_only(raw).ok_or_else(|| {
        AppError::Validation(format!(
            r#"Invalid "{}" date "{}" (format: YYYY-MM-DD)"#,
            name, raw
        ))
    })
}

/// Positive integer or the fallback.
fn parse_positive(raw: Option<&str>, fallback: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(fallback)
}
