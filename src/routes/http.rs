// GET handlers: metrics, health, version

use axum::{extract::State, http::HeaderMap, http::header::USER_AGENT, response::IntoResponse};
use tracing::info;

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /metrics: system snapshot and scraper outputs as one JSON object.
pub(super) async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info!(user_agent, "metrics request");
    axum::Json(state.service.collect().await)
}

pub(super) async fn health_handler() -> &'static str {
    "OK"
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
