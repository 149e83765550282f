use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::server::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "recipes-server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Ready when both the recipe store and the cache answer.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match state.storage.ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(backend = state.storage.backend_name(), error = %e, "storage not ready");
            format!("error: {e}")
        }
    };
    let cache = match state.listing.backend().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(mode = state.listing.backend().mode(), error = %e, "cache not ready");
            format!("error: {e}")
        }
    };

    let ready = storage == "ok" && cache == "ok";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "degraded" },
            "checks": {
                "storage": storage,
                "cache": cache,
            },
        })),
    )
}
