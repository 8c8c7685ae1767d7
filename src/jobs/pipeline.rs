//! # Content Pipeline Seam
//!
//! The orchestrator treats the content-generation pipeline as an opaque
//! async work function: invoked once per attempt, reporting step progress
//! through a [`ProgressHandle`](crate::jobs::queue::ProgressHandle), and
//! eventually resolving with an article payload or rejecting with a
//! [`PipelineError`]. Prompt construction, SEO/AEO scoring and publishing
//! live behind this trait, outside the core.
//!
//! Pipelines are expected to consult the
//! [`CircuitBreakerRegistry`](crate::resilience::CircuitBreakerRegistry)
//! before calling a named dependency and report the outcome back to it; a
//! denied admission is an ordinary transient failure that feeds the retry
//! path.

use async_trait::async_trait;

use crate::error::RankForgeError;
use crate::jobs::queue::ProgressHandle;
use crate::jobs::request::JobRequest;

/// Failure surfaced by a pipeline attempt.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A named downstream dependency (search, LLM, publish target) failed or
    /// refused admission
    #[error("dependency '{service}' failed: {message}")]
    Dependency { service: String, message: String },

    /// Anything else the pipeline wants to surface
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    pub fn dependency(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dependency {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

// A failed progress persist is an attempt failure; pipelines propagate it
// with `?` like any other rejection.
impl From<RankForgeError> for PipelineError {
    fn from(err: RankForgeError) -> Self {
        Self::Other(err.to_string())
    }
}

/// The long-running content work function invoked by the orchestrator.
///
/// One invocation is one attempt. Progress callbacks must not be issued
/// concurrently for the same job; the handle is awaited between steps, which
/// keeps record writes in program order.
#[async_trait]
pub trait ContentPipeline: Send + Sync + 'static {
    async fn run(
        &self,
        request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError>;
}
