use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lifelog_api::config::Config;
use lifelog_api::db::{MemoryStore, DAY_ENTRIES, GARMIN_DIVES};
use lifelog_api::{router, AppState};

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_many(
            DAY_ENTRIES,
            vec![
                json!({
                    "date": "2024-03-01T00:00:00.000Z",
                    "moodRating": 7,
                    "weight": "82.40",
                    "trackers": [
                        { "blockType": "mood", "value": 7, "note": "Sunny morning" },
                        { "blockType": "weight", "value": 82.4 }
                    ]
                }),
                json!({
                    "date": "2024-03-02T00:00:00.000Z",
                    "trackers": [
                        { "blockType": "mood", "value": "9", "note": "" },
                        { "blockType": "diving", "value": 2, "note": "Two reef dives" }
                    ]
                }),
                json!({
                    "date": "2024-03-04T00:00:00.000Z",
                    "moodRating": 5,
                    "weight": 81.6,
                    "dives": 1
                }),
                json!({
                    "date": "2024-03-10T00:00:00.000Z",
                    "moodRating": 8,
                    "minutesPainted": 45
                }),
            ],
        )
        .await;
    store
        .insert_many(
            GARMIN_DIVES,
            vec![
                json!({
                    "title": "Blue Hole",
                    "location": "Dahab",
                    "startTimeLocal": "2024-05-01 09:15:00",
                    "startTimeGMT": "2024-05-01 06:15:00",
                    "durationSeconds": 2700,
                    "maxDepthMeters": 32.4,
                    "diveType": "recreational"
                }),
                json!({
                    "title": "Lighthouse",
                    "location": "Dahab",
                    "startTimeLocal": "2024-05-02 10:22:00",
                    "startTimeGMT": "2024-05-02 07:22:00",
                    "durationSeconds": 3000,
                    "maxDepthMeters": 12.0,
                    "diveType": "instructing"
                }),
                json!({
                    "title": "Canyon",
                    "location": "Dahab",
                    "startTimeLocal": "2024-06-11 14:05:00",
                    "startTimeGMT": "2024-06-11 11:05:00",
                    "durationSeconds": 2400,
                    "maxDepthMeters": 24.5,
                    "diveType": "course"
                }),
            ],
        )
        .await;
    store
}

async fn app() -> Router {
    let store = seeded_store().await;
    router(AppState::new(Arc::new(store), Config::default()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cache, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, _, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, body) = get(app().await, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["backend"], "memory");
}

#[tokio::test]
async fn stats_for_mood_uses_flat_field_then_tracker() {
    let (status, cache, body) = get(
        app().await,
        "/api/day-entries/stats?start=2024-03-01&end=2024-03-31&field=moodRating",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("private, max-age=60"));
    assert_eq!(body["field"], "mood");
    assert_eq!(body["start"], "2024-03-01");
    assert_eq!(body["count"], 4);
    assert_eq!(body["average"], 7.25);
    assert_eq!(body["median"], 7.5);
    assert_eq!(body["minmax"], json!({ "min": 5.0, "max": 9.0 }));
    assert_eq!(body["distribution"]["7"], 1);
    assert_eq!(body["distribution"]["1"], 0);
    assert_eq!(body["distribution"].as_object().unwrap().len(), 10);
}

#[tokio::test]
async fn stats_for_weight_has_no_distribution() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/stats?start=2024-03-01&end=2024-03-31&field=weight",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body.get("distribution").is_none());
}

#[tokio::test]
async fn missing_range_is_bad_request() {
    let (status, cache, body) = get(app().await, "/api/day-entries/stats?field=mood").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cache.is_none());
    assert!(body["error"].as_str().unwrap().contains("start"));
}

#[tokio::test]
async fn unknown_field_lists_allowed_fields() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/stats/average?start=2024-03-01&end=2024-03-31&field=steps",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid field parameter. Allowed fields: mood, weight, diving, painting"
    );
}

#[tokio::test]
async fn distribution_rejects_weight() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/stats/distribution?start=2024-03-01&end=2024-03-31&field=weight",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Distribution endpoint only supports mood and diving fields"
    );
}

#[tokio::test]
async fn empty_mood_distribution_has_all_buckets() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/stats/distribution?start=2023-01-01&end=2023-01-31&field=mood",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 0);
    let buckets = body["distribution"].as_object().unwrap();
    assert_eq!(buckets.len(), 10);
    assert!(buckets.values().all(|v| v == 0));
}

#[tokio::test]
async fn diving_distribution_counts() {
    let (_, _, body) = get(
        app().await,
        "/api/day-entries/stats/distribution?start=2024-03-01&end=2024-03-31&field=dives",
    )
    .await;
    assert_eq!(body["field"], "diving");
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["distribution"]["1"], 1);
    assert_eq!(body["distribution"]["2"], 1);
    assert_eq!(body["distribution"]["0"], 0);
}

#[tokio::test]
async fn consistency_is_flat() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/stats/consistency?start=2024-03-01&end=2024-03-31&field=painting",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["variance"], 0.0);
    assert_eq!(body["coefficientOfVariation"], 0.0);
}

#[tokio::test]
async fn daily_series_fills_gaps() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/series?start=2024-03-01&end=2024-03-04&field=mood",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregate"], "daily");
    assert_eq!(body["count"], 4);
    assert_eq!(
        body["series"],
        json!([
            { "date": "2024-03-01", "value": 7.0 },
            { "date": "2024-03-02", "value": 9.0 },
            { "date": "2024-03-03", "value": null },
            { "date": "2024-03-04", "value": 5.0 }
        ])
    );
}

#[tokio::test]
async fn weekly_series_windows() {
    let (_, _, body) = get(
        app().await,
        "/api/day-entries/series?start=2024-03-01&end=2024-03-10&field=mood&aggregate=weekly",
    )
    .await;
    assert_eq!(
        body["series"],
        json!([
            { "start": "2024-03-01", "end": "2024-03-07", "value": 7.0, "count": 3 },
            { "start": "2024-03-08", "end": "2024-03-10", "value": 8.0, "count": 1 }
        ])
    );
}

#[tokio::test]
async fn reversed_range_gives_empty_series() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/series?start=2024-03-10&end=2024-03-01&field=mood&aggregate=weekly",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["series"], json!([]));
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn invalid_aggregate_is_bad_request() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/series?start=2024-03-01&end=2024-03-10&field=mood&aggregate=yearly",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("daily, weekly, monthly"));
}

#[tokio::test]
async fn notes_read_tracker_blocks() {
    let (status, _, body) = get(
        app().await,
        "/api/day-entries/series/notes?start=2024-03-01&end=2024-03-31&field=mood",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregate"], "notes");
    assert_eq!(
        body["notes"],
        json!([{ "date": "2024-03-01", "note": "Sunny morning" }])
    );
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn dive_basic_stats() {
    let (status, _, body) = get(app().await, "/api/garmin-dives/basic-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDives"], 3);
    assert_eq!(body["deepestDepthMeters"], "32.4");
    assert_eq!(body["totalBottomTimeSeconds"], "8100");
    assert_eq!(body["deepDives"]["count"], 1);
    assert_eq!(body["deepDives"]["deepDiveCutoffMeters"], 30);
    assert_eq!(body["intermediateDives"]["count"], 2);
    assert_eq!(body["intermediateDives"]["percentage"], "66.7");
    assert_eq!(body["instructingDives"]["percentage"], "33.3");
}

#[tokio::test]
async fn dive_search_by_month_name() {
    let (status, _, body) = get(app().await, "/api/garmin-dives/search?q=May").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocs"], 2);
    assert_eq!(body["limit"], 7);
    assert_eq!(body["docs"][0]["title"], "Lighthouse");
    assert_eq!(body["docs"][1]["title"], "Blue Hole");
}

#[tokio::test]
async fn dive_search_paginates_and_filters_type() {
    let (_, _, body) = get(app().await, "/api/garmin-dives/search?limit=1&page=2").await;
    assert_eq!(body["totalDocs"], 3);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["hasPrevPage"], true);
    assert_eq!(body["docs"][0]["title"], "Lighthouse");

    let (_, _, body) = get(app().await, "/api/garmin-dives/search?diveType=COURSE").await;
    assert_eq!(body["totalDocs"], 1);
    assert_eq!(body["docs"][0]["title"], "Canyon");
}

#[tokio::test]
async fn dive_by_date_time_with_neighbours() {
    let (status, _, body) = get(app().await, "/api/garmin-dives/by-date-time/2024-05-02_10-22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Lighthouse");
    assert_eq!(body["previousDive"], json!({ "startTimeLocal": "2024-06-11 14:05:00" }));
    assert_eq!(body["nextDive"], json!({ "startTimeLocal": "2024-05-01 09:15:00" }));

    let (_, _, body) = get(app().await, "/api/garmin-dives/by-date-time/2024-06-11_14-05").await;
    assert!(body["previousDive"].is_null());
}

#[tokio::test]
async fn dive_by_date_time_errors() {
    let (status, _, body) = get(app().await, "/api/garmin-dives/by-date-time/2024-05-02T10:22").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid format"));

    let (status, _, body) = get(app().await, "/api/garmin-dives/by-date-time/2023-01-01_08-00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No dive found for 2023-01-01_08-00.");
}

#[tokio::test]
async fn malformed_query_string_gets_json_error() {
    let (status, cache, body) = get(
        app().await,
        "/api/day-entries/stats?start=2024-03-01&start=2024-03-02&end=2024-03-31&field=mood",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cache.is_none());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid query string"));
}

#[tokio::test]
async fn dive_with_text_depth_still_counts() {
    let store = MemoryStore::new();
    store
        .insert_many(
            GARMIN_DIVES,
            vec![
                json!({ "durationSeconds": "1200", "maxDepthMeters": "unknown", "diveType": "recreational" }),
                json!({ "durationSeconds": 1800, "maxDepthMeters": 20.5, "diveType": "instructing" }),
            ],
        )
        .await;
    let app = router(AppState::new(Arc::new(store), Config::default()));

    let (status, _, body) = get(app, "/api/garmin-dives/basic-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDives"], 2);
    assert_eq!(body["totalBottomTimeSeconds"], "3000");
    assert_eq!(body["deepestDepthMeters"], "20.5");
    assert_eq!(body["intermediateDives"]["percentage"], "50.0");
    assert_eq!(body["recreationalDives"]["count"], 1);
}

#[tokio::test]
async fn bad_tracker_block_keeps_entry_in_stats() {
    let store = MemoryStore::new();
    store
        .insert_many(
            DAY_ENTRIES,
            vec![
                json!({ "date": "2024-04-01", "moodRating": 7, "trackers": [{ "value": 3 }] }),
                json!({ "date": "2024-04-02", "moodRating": 8, "note": 42 }),
            ],
        )
        .await;
    let app = router(AppState::new(Arc::new(store), Config::default()));

    let (status, _, body) = get(
        app,
        "/api/day-entries/stats/average?start=2024-04-01&end=2024-04-30&field=mood",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["average"], 7.5);
}
