use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod dates;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod stats;

use config::Config;
use db::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

pub fn router(state: AppState) -> Router {
    use handlers::{day_entries, dives, health};

    let day_entry_routes = Router::new()
        .route("/stats", get(day_entries::stats))
        .route("/stats/average", get(day_entries::average))
        .route("/stats/consistency", get(day_entries::consistency))
        .route("/stats/distribution", get(day_entries::distribution))
        .route("/series", get(day_entries::series))
        .route("/series/notes", get(day_entries::notes));

    let dive_routes = Router::new()
        .route("/basic-stats", get(dives::basic_stats))
        .route("/search", get(dives::search))
        .route("/by-date-time/:dateTime", get(dives::by_date_time));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/readyz", get(health::readyz))
        .nest("/api/day-entries", day_entry_routes)
        .nest("/api/garmin-dives", dive_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
