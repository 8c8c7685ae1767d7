//! # Failure Classification
//!
//! Determines whether a rejected attempt is eligible for retry. The observed
//! production behavior retries every work-function failure up to the budget,
//! so the default classifier is [`AlwaysRetryable`]; deployments that can
//! recognize unrecoverable failures (malformed input discovered mid-pipeline,
//! permanent authorization errors) plug in their own implementation.

use crate::jobs::pipeline::PipelineError;

/// Verdict on a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Eligible for another attempt while retry budget remains
    Retryable,
    /// Fail the job immediately without consuming the remaining budget
    Terminal,
}

/// Classifies work-function failures for retry eligibility.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, error: &PipelineError) -> FailureDisposition;
}

/// Default classifier: every failure is retryable up to `max_retries`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetryable;

impl FailureClassifier for AlwaysRetryable {
    fn classify(&self, _error: &PipelineError) -> FailureDisposition {
        FailureDisposition::Retryable
    }
}
