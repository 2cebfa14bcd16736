use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;

use crate::db::{FindQuery, Sort, Where, GARMIN_DIVES};
use crate::dto::{
    DeepDives, DiveBasicStatsResponse, DiveSearchQuery, DiveShare, DiveWithAdjacentResponse,
    IntermediateDives,
};
use crate::error::{AppError, AppResult};
use crate::handlers::response::cached_json;
use crate::models::dive::{AdjacentDive, DiveSummary, DiveType};
use crate::AppState;

const DEEP_DIVE_CUTOFF_METERS: u32 = 30;
const INTERMEDIATE_DIVES_START_METERS: u32 = 18;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Default)]
struct DiveTotals {
    dives: u64,
    deepest_meters: f64,
    bottom_time_seconds: f64,
    deep: u64,
    intermediate: u64,
    instructing: u64,
    recreational: u64,
}

impl DiveTotals {
    fn add(&mut self, dive: &DiveSummary) {
        let depth = dive.max_depth_meters.unwrap_or(0.0);
        self.dives += 1;
        self.bottom_time_seconds += dive.duration_seconds.unwrap_or(0.0);
        self.deepest_meters = self.deepest_meters.max(depth);
        if depth > DEEP_DIVE_CUTOFF_METERS as f64 {
            self.deep += 1;
        }
        if depth > INTERMEDIATE_DIVES_START_METERS as f64 {
            self.intermediate += 1;
        }
        match dive.kind() {
            Some(DiveType::Instructing) => self.instructing += 1,
            Some(DiveType::Recreational) => self.recreational += 1,
            _ => {}
        }
    }

    fn share(&self, count: u64) -> DiveShare {
        let percentage = if self.dives == 0 {
            0.0
        } else {
            count as f64 / self.dives as f64 * 100.0
        };
        DiveShare {
            count,
            percentage: format!("{:.1}", percentage),
        }
    }

    fn into_response(self) -> DiveBasicStatsResponse {
        DiveBasicStatsResponse {
            total_dives: self.dives,
            deepest_depth_meters: format!("{:.1}", self.deepest_meters),
            total_bottom_time_seconds: format!("{:.0}", self.bottom_time_seconds),
            instructing_dives: self.share(self.instructing),
            recreational_dives: self.share(self.recreational),
            intermediate_dives: IntermediateDives {
                intermediate_dives_start_meters: INTERMEDIATE_DIVES_START_METERS,
                share: self.share(self.intermediate),
            },
            deep_dives: DeepDives {
                deep_dive_cutoff_meters: DEEP_DIVE_CUTOFF_METERS,
                share: self.share(self.deep),
            },
        }
    }
}

/// GET /api/garmin-dives/basic-stats
pub async fn basic_stats(State(state): State<AppState>) -> AppResult<Response> {
    let result = state.store.find(FindQuery::new(GARMIN_DIVES)).await?;

    let mut totals = DiveTotals::default();
    for doc in result.docs {
        let dive = serde_json::from_value::<DiveSummary>(doc).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Malformed dive counted without depth or duration");
            DiveSummary::default()
        });
        totals.add(&dive);
    }

    Ok(cached_json(
        state.config.stats_cache_max_age,
        totals.into_response(),
    ))
}

/// `"jan"`/`"January"` → `"-01-"`, which matches the month of a
/// `YYYY-MM-DD ...` timestamp.
fn month_pattern(term: &str) -> Option<String> {
    let term = term.to_lowercase();
    MONTHS
        .iter()
        .position(|name| *name == term || (term.len() == 3 && name.starts_with(term.as_str())))
        .map(|i| format!("-{:02}-", i + 1))
}

fn search_filter(query: &DiveSearchQuery) -> Option<Where> {
    let mut clauses = Vec::new();

    let search = query.q.as_deref().map(str::trim).unwrap_or_default();
    if !search.is_empty() {
        let date_search = month_pattern(search).unwrap_or_else(|| search.to_string());
        clauses.push(Where::Or(vec![
            Where::like("title", search),
            Where::like("location", search),
            Where::like("startTimeLocal", date_search.as_str()),
            Where::like("startTimeGMT", date_search),
        ]));
    }

    if let Some(kind) = query.dive_type.as_deref().and_then(DiveType::parse) {
        clauses.push(Where::equals("diveType", kind.as_str()));
    }

    Where::all(clauses)
}

/// GET /api/garmin-dives/search
pub async fn search(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DiveSearchQuery>, AppError>,
) -> AppResult<Response> {
    let find = FindQuery::new(GARMIN_DIVES)
        .filter(search_filter(&query))
        .sort(Sort::desc("startTimeGMT"))
        .page(query.page())
        .limit(query.limit());

    let page = state.store.find(find).await?;
    tracing::debug!(
        total_docs = page.total_docs,
        page = page.page,
        "Dive search"
    );
    Ok(cached_json(state.config.stats_cache_max_age, page))
}

/// `YYYY-MM-DD_HH-MM` → `YYYY-MM-DD HH:MM`
fn parse_dive_date_time(param: &str) -> Option<String> {
    let bytes = param.as_bytes();
    let shape_ok = bytes.len() == 16
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 | 13 => *b == b'-',
            10 => *b == b'_',
            _ => b.is_ascii_digit(),
        });
    shape_ok.then(|| format!("{} {}:{}", &param[..10], &param[11..13], &param[14..16]))
}

async fn first_dive(state: &AppState, filter: Where, sort: Sort) -> AppResult<Option<Value>> {
    let query = FindQuery::new(GARMIN_DIVES)
        .filter(Some(filter))
        .sort(sort)
        .limit(1);
    let page = state.store.find(query).await?;
    Ok(page.docs.into_iter().next())
}

/// GET /api/garmin-dives/by-date-time/:dateTime
pub async fn by_date_time(
    State(state): State<AppState>,
    Path(date_time): Path<String>,
) -> AppResult<Response> {
    let param = date_time.trim();
    if param.is_empty() {
        return Err(AppError::Validation(
            "Pass the date/time as YYYY-MM-DD_HH-MM at the end of the URL.".into(),
        ));
    }
    let lookup = parse_dive_date_time(param).ok_or_else(|| {
        AppError::Validation(
            "Invalid format. Use YYYY-MM-DD_HH-MM (example: 2025-12-24_10-22).".into(),
        )
    })?;

    let dive = first_dive(&state, Where::like("startTimeLocal", lookup), Sort::asc("startTimeLocal"))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No dive found for {}.", param)))?;

    let current = AdjacentDive::from_doc(&dive);
    let (previous_dive, next_dive) = match current {
        Some(current) => {
            let start = current.start_time_local;
            let (younger, older) = tokio::join!(
                first_dive(
                    &state,
                    Where::greater_than("startTimeLocal", start.as_str()),
                    Sort::asc("startTimeLocal"),
                ),
                first_dive(
                    &state,
                    Where::less_than("startTimeLocal", start.as_str()),
                    Sort::desc("startTimeLocal"),
                ),
            );
            (
                younger?.as_ref().and_then(AdjacentDive::from_doc),
                older?.as_ref().and_then(AdjacentDive::from_doc),
            )
        }
        None => (None, None),
    };

    let dive = match dive {
        Value::Object(map) => map,
        _ => return Err(AppError::Internal(anyhow::anyhow!("dive document is not an object"))),
    };

    Ok(cached_json(
        state.config.stats_cache_max_age,
        DiveWithAdjacentResponse {
            dive,
            previous_dive,
            next_dive,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_pattern() {
        assert_eq!(month_pattern("jan").as_deref(), Some("-01-"));
        assert_eq!(month_pattern("December").as_deref(), Some("-12-"));
        assert_eq!(month_pattern("SEP").as_deref(), Some("-09-"));
        assert_eq!(month_pattern("ju"), None);
        assert_eq!(month_pattern("reef"), None);
    }

    #[test]
    fn test_parse_dive_date_time() {
        assert_eq!(
            parse_dive_date_time("2025-12-24_10-22").as_deref(),
            Some("2025-12-24 10:22")
        );
        assert_eq!(parse_dive_date_time("2025-12-24 10:22"), None);
        assert_eq!(parse_dive_date_time("2025-12-24_10-2"), None);
        assert_eq!(parse_dive_date_time("2025-1a-24_10-22"), None);
    }

    #[test]
    fn test_search_filter_combines_text_and_type() {
        let query = DiveSearchQuery {
            q: Some(" may ".into()),
            dive_type: Some("Course".into()),
            ..Default::default()
        };
        let Some(Where::And(clauses)) = search_filter(&query) else {
            panic!("expected an And filter");
        };
        assert_eq!(clauses.len(), 2);
        match &clauses[0] {
            Where::Or(text) => {
                assert_eq!(text[0], Where::like("title", "may"));
                assert_eq!(text[2], Where::like("startTimeLocal", "-05-"));
            }
            other => panic!("unexpected clause {:?}", other),
        }
        assert_eq!(clauses[1], Where::equals("diveType", "course"));
    }

    #[test]
    fn test_search_filter_ignores_unknown_type() {
        let query = DiveSearchQuery {
            dive_type: Some("wreck".into()),
            ..Default::default()
        };
        assert_eq!(search_filter(&query), None);
    }

    #[test]
    fn test_totals_without_dives() {
        let stats = DiveTotals::default().into_response();
        assert_eq!(stats.total_dives, 0);
        assert_eq!(stats.deepest_depth_meters, "0.0");
        assert_eq!(stats.total_bottom_time_seconds, "0");
        assert_eq!(stats.deep_dives.share.percentage, "0.0");
    }

    #[test]
    fn test_totals_thresholds_are_exclusive() {
        let mut totals = DiveTotals::default();
        for (depth, kind) in [(18.0, "instructing"), (18.5, "recreational"), (30.0, "course"), (31.2, "instructing")] {
            totals.add(&DiveSummary {
                duration_seconds: Some(1800.4),
                max_depth_meters: Some(depth),
                dive_type: Some(kind.into()),
            });
        }
        let stats = totals.into_response();
        assert_eq!(stats.total_dives, 4);
        assert_eq!(stats.deepest_depth_meters, "31.2");
        assert_eq!(stats.total_bottom_time_seconds, "7202");
        assert_eq!(stats.intermediate_dives.share.count, 3);
        assert_eq!(stats.intermediate_dives.share.percentage, "75.0");
        assert_eq!(stats.deep_dives.share.count, 1);
        assert_eq!(stats.instructing_dives.count, 2);
        assert_eq!(stats.recreational_dives.percentage, "25.0");
    }
}
