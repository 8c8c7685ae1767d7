//! # Structured Error Handling
//!
//! Crate-wide error taxonomy for the orchestration core. Component boundaries
//! (store, pipeline) carry their own error types and convert into
//! [`RankForgeError`] at the orchestrator seam.

use uuid::Uuid;

use crate::jobs::store::StoreError;

/// Top-level error type for orchestration operations.
#[derive(Debug, thiserror::Error)]
pub enum RankForgeError {
    /// Submission failed basic shape validation. Surfaced synchronously to
    /// the caller; no job record is created.
    #[error("validation error: {0}")]
    Validation(String),

    /// An illegal state machine transition was attempted on a job record.
    #[error("state transition error: {0}")]
    StateTransition(String),

    /// The durable job store rejected a read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// No job record exists for the given id.
    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    /// A test-observability wait elapsed before the job reached a terminal
    /// state.
    #[error("timed out waiting for job {0} to reach a terminal state")]
    WaitTimeout(Uuid),

    /// Invalid or unparseable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, RankForgeError>;
