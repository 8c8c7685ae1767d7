//! # Health Handlers
//!
//! Cheap liveness endpoints. The status-read path must stay available while
//! many jobs sit in retry backoff, so these never touch the store.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::web::state::AppState;

/// Basic health check: GET /health
pub async fn basic_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Circuit breaker states: GET /health/breakers
pub async fn breaker_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "breakers": state.breakers.snapshot(),
    }))
}
