use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `Cache-Control` value for results a browser may reuse briefly but a shared
/// cache must not store.
pub fn private_max_age(max_age: u32) -> HeaderValue {
    HeaderValue::from_str(&format!("private, max-age={}", max_age))
        .unwrap_or_else(|_| HeaderValue::from_static("private"))
}

/// JSON body with a private, short-lived cache directive.
pub fn cached_json<T: Serialize>(max_age: u32, body: T) -> Response {
    ([(header::CACHE_CONTROL, private_max_age(max_age))], Json(body)).into_response()
}
