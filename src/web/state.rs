//! # Web API Application State
//!
//! Shared state for the HTTP surface. Constructed once at process start and
//! handed to the router; the orchestrator and breaker registry are injected
//! explicitly so tests build isolated instances.

use std::sync::Arc;

use crate::jobs::queue::JobQueue;
use crate::resilience::CircuitBreakerRegistry;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub breakers: Arc<CircuitBreakerRegistry>,
}

impl AppState {
    pub fn new(queue: Arc<JobQueue>, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self { queue, breakers }
    }
}
