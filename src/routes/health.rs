use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// The service itself holds no connections, so being able to answer is the whole check.
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}
