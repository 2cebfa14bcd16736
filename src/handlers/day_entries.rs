use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::WithRejection;

use crate::db::DAY_ENTRIES;
use crate::dto::{
    AverageResponse, ConsistencyResponse, DistributionResponse, NotesResponse, SeriesQuery,
    SeriesResponse, StatsParams, StatsQuery, StatsResponse,
};
use crate::error::{AppError, AppResult};
use crate::handlers::response::cached_json;
use crate::models::day_entry::DayEntry;
use crate::stats::aggregate::{self, fill_distribution_gaps, Distribution};
use crate::stats::series::{build_series, collect_daily_values, collect_notes};
use crate::stats::DateRangeScanner;
use crate::AppState;

/// Every value of the field recorded in the range, in ascending date order.
async fn field_values(state: &AppState, params: &StatsParams) -> AppResult<Vec<f64>> {
    let field = params.field;
    let values = DateRangeScanner::new(
        state.store.as_ref(),
        DAY_ENTRIES,
        params.start,
        params.end,
        state.config.stats_page_size,
    )
    .collect(|entry: &DayEntry| entry.numeric_value(field))
    .await?;

    tracing::debug!(
        field = %field,
        start = %params.start,
        end = %params.end,
        count = values.len(),
        "Collected day-entry values"
    );
    Ok(values)
}

fn log_rejection(endpoint: &str, err: &AppError) {
    tracing::debug!(endpoint, error = %err, "Rejected stats request");
}

fn validated(endpoint: &str, query: &StatsQuery) -> AppResult<StatsParams> {
    query.validate().map_err(|e| {
        log_rejection(endpoint, &e);
        e
    })
}

/// GET /api/day-entries/stats
pub async fn stats(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> AppResult<Response> {
    let params = validated("stats", &query)?;
    let values = field_values(&state, &params).await?;

    let distribution = params
        .field
        .supports_distribution()
        .then(|| fill_distribution_gaps(&Distribution::from_values(&values), params.field));

    let body = StatsResponse {
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        count: values.len(),
        average: aggregate::average(&values),
        median: aggregate::median(&values),
        distribution,
        consistency: aggregate::consistency(&values),
        minmax: aggregate::min_max(&values),
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}

/// GET /api/day-entries/stats/average
pub async fn average(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> AppResult<Response> {
    let params = validated("stats/average", &query)?;
    let values = field_values(&state, &params).await?;

    let body = AverageResponse {
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        count: values.len(),
        average: aggregate::average(&values),
        median: aggregate::median(&values),
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}

/// GET /api/day-entries/stats/consistency
pub async fn consistency(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> AppResult<Response> {
    let params = validated("stats/consistency", &query)?;
    let values = field_values(&state, &params).await?;

    let body = ConsistencyResponse {
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        count: values.len(),
        consistency: aggregate::consistency(&values),
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}

/// GET /api/day-entries/stats/distribution
pub async fn distribution(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> AppResult<Response> {
    let params = validated("stats/distribution", &query)?;
    params.require_distribution().map_err(|e| {
        log_rejection("stats/distribution", &e);
        e
    })?;
    let values = field_values(&state, &params).await?;

    let distribution = fill_distribution_gaps(&Distribution::from_values(&values), params.field);
    let body = DistributionResponse {
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        total_count: distribution.total(),
        distribution,
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}

/// GET /api/day-entries/series
pub async fn series(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SeriesQuery>, AppError>,
) -> AppResult<Response> {
    let (params, aggregate) = query.validate().map_err(|e| {
        log_rejection("series", &e);
        e
    })?;

    let daily = collect_daily_values(
        state.store.as_ref(),
        params.field,
        params.start,
        params.end,
        state.config.stats_page_size,
    )
    .await?;
    let series = build_series(&daily, aggregate, params.field, params.start, params.end);

    tracing::debug!(
        field = %params.field,
        aggregate = %aggregate,
        points = series.len(),
        "Built series"
    );

    let body = SeriesResponse {
        aggregate,
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        count: series.len(),
        series,
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}

/// GET /api/day-entries/series/notes
pub async fn notes(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> AppResult<Response> {
    let params = validated("series/notes", &query)?;
    let notes = collect_notes(
        state.store.as_ref(),
        params.field,
        params.start,
        params.end,
        state.config.stats_page_size,
    )
    .await?;

    let body = NotesResponse {
        aggregate: "notes",
        field: params.field,
        start: params.start_str(),
        end: params.end_str(),
        count: notes.len(),
        notes,
    };
    Ok(cached_json(state.config.stats_cache_max_age, body))
}
