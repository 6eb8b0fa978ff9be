use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::AppState;

pub mod movies;
pub mod recommendations;
pub mod users;
pub mod watchlist;
pub mod webhook;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn test() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Test successful")
}

/// Round-trips to the user store
pub async fn store_health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "Store connection OK"),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Store connection FAILED")
        }
    }
}
