use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::db::{FindQuery, DAY_ENTRIES};
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "lifelog-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once the store answers a one-document query.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = state.store.backend();
    let check = FindQuery::new(DAY_ENTRIES).limit(1);

    match state.store.find(check).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "store": "ok", "backend": backend },
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, backend, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "checks": { "store": "failed", "backend": backend },
                })),
            )
        }
    }
}
