//! # Job Queue Orchestrator
//!
//! Accepts generation/refresh requests, drives each job's execution as an
//! independent spawned task, applies retry with exponential backoff, and
//! serves status reads. One logical orchestrator instance owns all job
//! records; jobs run fully in parallel while execution within a single job
//! is strictly sequential.
//!
//! Submission is fire-and-forget from the caller's perspective: `submit`
//! persists the `queued` record, spawns the execution task and returns the
//! acknowledgement immediately. Callers discover terminal outcomes by
//! polling the status-read path; tests use [`JobQueue::wait_for_terminal`]
//! instead of sleeping.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{RankForgeError, Result};
use crate::jobs::classifier::{AlwaysRetryable, FailureClassifier, FailureDisposition};
use crate::jobs::pipeline::ContentPipeline;
use crate::jobs::record::{JobRecord, JobStatus};
use crate::jobs::request::JobRequest;
use crate::jobs::store::JobStore;

/// Exponential backoff with additive jitter.
///
/// Delay before retry attempt `n` (1-indexed) is
/// `base_delay_ms * 2^n + jitter[0, jitter_ms)`. Uncapped by design; the
/// retry ceiling bounds the worst case.
#[derive(Debug, Clone, Serialize)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            jitter_ms: 200,
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        // Shift guard: 2^20s of base delay is already far beyond any retry ceiling.
        let exponent = retry_count.min(20);
        let base = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Retry ceiling fixed into each record at creation
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Sleeps out retry backoff delays without occupying a worker.
///
/// Injected so tests can fast-forward retries deterministically instead of
/// waiting out real timers.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    async fn delay(&self, duration: Duration);
}

/// Production scheduler backed by the tokio timer wheel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl RetryScheduler for TokioScheduler {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Synchronous acknowledgement returned by `submit`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub request_id: String,
}

/// Outcome of one failed attempt, carried back to the retry driver.
struct AttemptFailure {
    message: String,
    disposition: FailureDisposition,
}

impl AttemptFailure {
    fn infrastructure(err: &RankForgeError) -> Self {
        Self {
            message: err.to_string(),
            disposition: FailureDisposition::Retryable,
        }
    }
}

/// Single logical orchestrator instance.
///
/// Constructed once at process start and passed explicitly to whatever
/// serves the submission/status endpoints; no ambient singletons, so tests
/// construct isolated instances freely.
pub struct JobQueue {
    core: Arc<QueueCore>,
}

struct QueueCore {
    store: Arc<dyn JobStore>,
    pipeline: Arc<dyn ContentPipeline>,
    classifier: Arc<dyn FailureClassifier>,
    scheduler: Arc<dyn RetryScheduler>,
    config: QueueConfig,
    /// Write-through cache for fast status reads; never the sole source of
    /// truth; cold misses fall back to the store
    index: DashMap<Uuid, JobRecord>,
    /// Per-job status feeds backing the terminal-state wait hook
    watchers: DashMap<Uuid, watch::Sender<JobStatus>>,
}

impl JobQueue {
    /// Create an orchestrator with the default classifier (everything
    /// retryable) and the tokio timer scheduler.
    pub fn new(
        store: Arc<dyn JobStore>,
        pipeline: Arc<dyn ContentPipeline>,
        config: QueueConfig,
    ) -> Self {
        Self::with_components(
            store,
            pipeline,
            config,
            Arc::new(AlwaysRetryable),
            Arc::new(TokioScheduler),
        )
    }

    /// Create an orchestrator with explicit classifier and scheduler.
    pub fn with_components(
        store: Arc<dyn JobStore>,
        pipeline: Arc<dyn ContentPipeline>,
        config: QueueConfig,
        classifier: Arc<dyn FailureClassifier>,
        scheduler: Arc<dyn RetryScheduler>,
    ) -> Self {
        Self {
            core: Arc::new(QueueCore {
                store,
                pipeline,
                classifier,
                scheduler,
                config,
                index: DashMap::new(),
                watchers: DashMap::new(),
            }),
        }
    }

    /// Accept a job request.
    ///
    /// Validates the payload, persists a `queued` record, spawns execution
    /// and returns immediately. The returned job id is resolvable via
    /// [`get_job`](Self::get_job) as soon as this call returns.
    pub async fn submit(&self, payload: serde_json::Value) -> Result<SubmitAck> {
        let request = JobRequest::from_payload(payload)?;
        let record = JobRecord::new(&request, self.core.config.max_retries);
        let job_id = record.id;

        let (status_tx, _status_rx) = watch::channel(JobStatus::Queued);
        self.core.watchers.insert(job_id, status_tx);
        self.core.index.insert(job_id, record.clone());

        if let Err(err) = self.core.store.put(&record).await {
            // The record never became visible; undo the in-memory entry so a
            // failed submit leaves no trace.
            self.core.index.remove(&job_id);
            self.core.watchers.remove(&job_id);
            return Err(err.into());
        }

        info!(
            job_id = %job_id,
            request_id = %record.request_id,
            client_id = %record.client_id,
            keyword = %request.keyword,
            mode = %request.mode,
            "📨 Job accepted"
        );

        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            run_job(core, request, job_id).await;
        });

        Ok(SubmitAck {
            job_id,
            status: JobStatus::Queued,
            request_id: record.request_id,
        })
    }

    /// Read a job record: in-memory index first, then the durable store.
    /// No side effects.
    pub async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>> {
        if let Some(entry) = self.core.index.get(&id) {
            return Ok(Some(entry.value().clone()));
        }
        Ok(self.core.store.get(id).await?)
    }

    /// Block until the job reaches `completed` or `failed`, then return the
    /// final record. Test observability hook; production callers poll.
    pub async fn wait_for_terminal(&self, id: Uuid, timeout: Duration) -> Result<JobRecord> {
        let mut status_rx = self
            .core
            .watchers
            .get(&id)
            .map(|entry| entry.value().subscribe())
            .ok_or(RankForgeError::JobNotFound(id))?;

        tokio::time::timeout(timeout, status_rx.wait_for(JobStatus::is_terminal))
            .await
            .map_err(|_| RankForgeError::WaitTimeout(id))?
            .map_err(|_| RankForgeError::JobNotFound(id))?;

        self.get_job(id)
            .await?
            .ok_or(RankForgeError::JobNotFound(id))
    }
}

/// Progress callback handle supplied to each pipeline attempt.
///
/// Each `report` performs the `processing → processing` transition and
/// persists the record before returning, so ticks land in program order.
#[derive(Clone)]
pub struct ProgressHandle {
    core: Arc<QueueCore>,
    job_id: Uuid,
}

impl ProgressHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub async fn report(
        &self,
        step: u32,
        total_steps: u32,
        step_name: impl Into<String>,
    ) -> Result<()> {
        let name = step_name.into();
        debug!(
            job_id = %self.job_id,
            step,
            total_steps,
            step_name = %name,
            "Progress tick"
        );
        self.core
            .commit(self.job_id, |record| {
                record.record_progress(step, total_steps, &name)
            })
            .await
            .map(|_| ())
    }
}

impl QueueCore {
    /// Apply a guarded mutation and write it through: mutate a copy, persist
    /// it, then publish to the index. A store rejection leaves the index at
    /// the previous committed state.
    async fn commit<F>(&self, job_id: Uuid, mutate: F) -> Result<JobRecord>
    where
        F: FnOnce(&mut JobRecord) -> Result<()>,
    {
        let mut candidate = self
            .index
            .get(&job_id)
            .map(|entry| entry.value().clone())
            .ok_or(RankForgeError::JobNotFound(job_id))?;
        mutate(&mut candidate)?;
        self.store.put(&candidate).await?;
        self.index.insert(job_id, candidate.clone());
        self.notify_status(job_id, candidate.status);
        Ok(candidate)
    }

    fn notify_status(&self, job_id: Uuid, status: JobStatus) {
        if let Some(entry) = self.watchers.get(&job_id) {
            entry.value().send_replace(status);
        }
    }

    fn retry_budget(&self, job_id: Uuid) -> (u32, u32) {
        self.index
            .get(&job_id)
            .map(|entry| (entry.retry_count, entry.max_retries))
            .unwrap_or((0, 0))
    }

    /// `queued → processing`. The in-memory transition happens first so a
    /// store outage here is counted as an attempt failure and retried
    /// without wedging the record in `queued`.
    async fn begin_attempt(&self, job_id: Uuid) -> Result<()> {
        let snapshot = {
            let mut entry = self
                .index
                .get_mut(&job_id)
                .ok_or(RankForgeError::JobNotFound(job_id))?;
            if entry.status == JobStatus::Queued {
                entry.begin()?;
                Some(entry.value().clone())
            } else {
                None
            }
        };

        if let Some(record) = snapshot {
            self.notify_status(job_id, record.status);
            self.store.put(&record).await?;
        }
        Ok(())
    }

    /// Book a retry. If the store is unavailable the increment is applied
    /// in-memory anyway so the retry budget stays monotonic.
    async fn schedule_retry(&self, job_id: Uuid) -> u32 {
        match self.commit(job_id, JobRecord::schedule_retry).await {
            Ok(record) => record.retry_count,
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "Retry booking not persisted");
                self.index
                    .get_mut(&job_id)
                    .and_then(|mut entry| {
                        entry.schedule_retry().ok()?;
                        Some(entry.retry_count)
                    })
                    .unwrap_or(u32::MAX)
            }
        }
    }

    /// Terminal failure. Falls back to an in-memory transition when the
    /// store write fails so watchers still observe the terminal state.
    async fn fail_job(&self, job_id: Uuid, message: &str) {
        match self
            .commit(job_id, |record| record.fail(message.to_string()))
            .await
        {
            Ok(record) => {
                error!(
                    job_id = %job_id,
                    retry_count = record.retry_count,
                    error = %message,
                    "❌ Job failed"
                );
            }
            Err(err) => {
                error!(job_id = %job_id, error = %err, "Terminal failure not persisted");
                if let Some(mut entry) = self.index.get_mut(&job_id) {
                    let _ = entry.fail(message.to_string());
                }
                self.notify_status(job_id, JobStatus::Failed);
            }
        }
    }
}

/// One attempt: transition in, run the pipeline, commit the outcome.
async fn execute_attempt(
    core: &Arc<QueueCore>,
    request: &JobRequest,
    job_id: Uuid,
) -> std::result::Result<(), AttemptFailure> {
    core.begin_attempt(job_id)
        .await
        .map_err(|err| AttemptFailure::infrastructure(&err))?;

    let progress = ProgressHandle {
        core: Arc::clone(core),
        job_id,
    };

    match core.pipeline.run(request, progress).await {
        Ok(result) => core
            .commit(job_id, |record| record.complete(result))
            .await
            .map(|record| {
                info!(
                    job_id = %job_id,
                    retry_count = record.retry_count,
                    total_steps = record.total_steps,
                    "✅ Job completed"
                );
            })
            .map_err(|err| AttemptFailure::infrastructure(&err)),
        Err(err) => {
            let disposition = core.classifier.classify(&err);
            Err(AttemptFailure {
                message: err.to_string(),
                disposition,
            })
        }
    }
}

/// Per-job execution task: drives attempts until a terminal state.
///
/// Every failure is caught here; nothing escapes to crash the process. A
/// retry is only booked after the prior attempt has fully rejected, so the
/// record has exactly one writer at any time.
async fn run_job(core: Arc<QueueCore>, request: JobRequest, job_id: Uuid) {
    loop {
        let failure = match execute_attempt(&core, &request, job_id).await {
            Ok(()) => return,
            Err(failure) => failure,
        };

        let (retry_count, max_retries) = core.retry_budget(job_id);
        let exhausted = retry_count >= max_retries;
        if exhausted || failure.disposition == FailureDisposition::Terminal {
            core.fail_job(job_id, &failure.message).await;
            return;
        }

        let retry_count = core.schedule_retry(job_id).await;
        if retry_count == u32::MAX {
            // Record vanished from the index; nothing left to drive.
            return;
        }
        let delay = core.config.backoff.delay_for(retry_count);
        warn!(
            job_id = %job_id,
            retry_count,
            max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %failure.message,
            "🔁 Attempt rejected, retry scheduled"
        );
        core.scheduler.delay(delay).await;
    }
}
