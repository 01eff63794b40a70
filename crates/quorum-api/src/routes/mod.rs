pub mod pages;
pub mod polls;

use axum::{http::StatusCode, response::IntoResponse, Json};

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
