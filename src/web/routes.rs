//! # Web API Route Definitions
//!
//! Route structure for the orchestration HTTP surface.

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Create API v1 routes
///
/// All v1 routes are prefixed with `/v1`:
/// - `POST /v1/jobs` - submit a generation/refresh job
/// - `GET /v1/jobs` - job status by `jobId` query parameter
/// - `GET /v1/jobs/:job_id` - job status by path segment
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/jobs",
            post(handlers::jobs::submit_job).get(handlers::jobs::get_job_by_query),
        )
        .route("/jobs/:job_id", get(handlers::jobs::get_job))
}

/// Create health routes
///
/// - `/health` - basic liveness check
/// - `/health/breakers` - per-dependency circuit breaker states
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::basic_health))
        .route("/health/breakers", get(handlers::health::breaker_health))
}

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/v1", api_v1_routes())
        .merge(health_routes())
        .with_state(state)
}
