use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn ping() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Roster server is running",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let stats = state.postgres().pool_stats();
    let (status, database) = match state.postgres().ping().await {
        Ok(()) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "pool_size": stats.size,
                "idle_connections": stats.idle,
                "max_connections": stats.max_size,
            }),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "unhealthy", "error": err.to_string() }),
        ),
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "healthy" } else { "unhealthy" },
            "timestamp": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "database": database,
                "identity_webhooks": state.webhook_verifier.is_some(),
            },
        })),
    )
}
