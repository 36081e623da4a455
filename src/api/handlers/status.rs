//! Liveness and diagnostics handlers.

use crate::{types::Result, AppState};
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn db_status(State(state): State<AppState>) -> Result<Json<Value>> {
    state.store.ping().await?;

    Ok(Json(json!({
        "status": "ok",
        "message": "Database connected successfully",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn server_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "uptime": state.started.elapsed().as_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Catch-all for unmatched paths.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "path": uri.path(),
        })),
    )
}
