//! # Web API
//!
//! Transport layer over the orchestrator: job submission, status polling and
//! health. The contract is deliberately small; submission acknowledges with
//! 202 and everything after that is discovered by polling.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
