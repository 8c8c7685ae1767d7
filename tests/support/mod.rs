//! Shared scripted pipelines and schedulers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use rankforge_core::jobs::{
    ContentPipeline, FailureClassifier, FailureDisposition, JobRequest, PipelineError,
    ProgressHandle, RetryScheduler,
};

/// Reports `1/n` through `n/n` then resolves with a fixed article payload.
pub struct StepwisePipeline {
    pub total_steps: u32,
}

#[async_trait]
impl ContentPipeline for StepwisePipeline {
    async fn run(
        &self,
        request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError> {
        for step in 1..=self.total_steps {
            progress
                .report(step, self.total_steps, format!("step-{step}"))
                .await?;
        }
        Ok(json!({ "html": "<p>ok</p>", "keyword": request.keyword }))
    }
}

/// Rejects every attempt with the same message.
pub struct FailingPipeline {
    pub message: String,
}

#[async_trait]
impl ContentPipeline for FailingPipeline {
    async fn run(
        &self,
        _request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError> {
        progress.report(1, 2, "about-to-fail").await?;
        Err(PipelineError::other(self.message.clone()))
    }
}

/// Rejects the first `failures` attempts, then resolves.
pub struct FlakyPipeline {
    remaining: AtomicU32,
}

impl FlakyPipeline {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl ContentPipeline for FlakyPipeline {
    async fn run(
        &self,
        request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError> {
        let before = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if before > 0 {
            return Err(PipelineError::dependency("ai-provider", "still warming up"));
        }
        progress.report(1, 1, "final-attempt").await?;
        Ok(json!({ "html": "<p>recovered</p>", "keyword": request.keyword }))
    }
}

/// Blocks until released, then resolves. Lets tests observe a job that is
/// guaranteed not to have reached a terminal state yet.
pub struct GatedPipeline {
    pub gate: Arc<Notify>,
}

#[async_trait]
impl ContentPipeline for GatedPipeline {
    async fn run(
        &self,
        request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError> {
        self.gate.notified().await;
        progress.report(1, 1, "released").await?;
        Ok(json!({ "keyword": request.keyword }))
    }
}

/// Scheduler that never sleeps; retries run back to back.
pub struct InstantScheduler;

#[async_trait]
impl RetryScheduler for InstantScheduler {
    async fn delay(&self, _duration: Duration) {}
}

/// Scheduler that records every requested delay without sleeping.
#[derive(Default)]
pub struct RecordingScheduler {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl RetryScheduler for RecordingScheduler {
    async fn delay(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Classifier that treats every failure as unrecoverable.
pub struct NothingRetryable;

impl FailureClassifier for NothingRetryable {
    fn classify(&self, _error: &PipelineError) -> FailureDisposition {
        FailureDisposition::Terminal
    }
}

/// A well-formed generate submission for the given keyword.
pub fn generate_payload(keyword: &str, request_id: &str) -> serde_json::Value {
    json!({
        "keyword": keyword,
        "mode": "generate",
        "requestId": request_id,
        "clientId": "test-client",
    })
}
