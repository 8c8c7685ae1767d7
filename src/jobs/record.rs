//! # Job Record and Status State Machine
//!
//! The [`JobRecord`] is the single source of truth for one generation or
//! refresh request. Status transitions are guarded: `queued → processing →
//! completed | failed`, with retries re-entering `processing` on the same
//! record rather than minting a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{RankForgeError, Result};
use crate::jobs::request::JobRequest;

/// Job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted and persisted, execution not yet started
    Queued,
    /// An attempt is running (or waiting out a retry backoff)
    Processing,
    /// Work function resolved; result payload is set
    Completed,
    /// Retry budget exhausted or failure classified terminal; error is set
    Failed,
}

impl JobStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an active state (an attempt may be in flight)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Queued
    }
}

/// The state machine instance for one generation/refresh request.
///
/// Owned exclusively by the orchestrator; every mutation is written through
/// to the durable store before it is considered committed. Serialized field
/// names and millisecond-epoch timestamps form the wire contract of the
/// status-read endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Primary key in the store; assigned once at creation, never reused
    pub id: Uuid,
    /// Caller-supplied correlation token, copied from the request
    pub request_id: String,
    /// Caller-supplied correlation token, copied from the request
    pub client_id: String,
    pub status: JobStatus,
    /// Monotonically non-decreasing within an attempt; not reset across
    /// retries since the same record is reused
    pub step: u32,
    pub total_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    /// Opaque success payload, present iff `status == completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Human-readable failure description, present iff `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Completed retry attempts so far; bounded by `max_retries`
    pub retry_count: u32,
    pub max_retries: u32,
    /// Timestamp of the most recent retry scheduling
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a fresh `queued` record for an accepted request.
    pub fn new(request: &JobRequest, max_retries: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: request.request_id.clone(),
            client_id: request.client_id.clone(),
            status: JobStatus::Queued,
            step: 0,
            total_steps: 0,
            step_name: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries,
            last_attempt_at: None,
        }
    }

    /// `queued → processing`: first attempt begins.
    ///
    /// Sets `started_at` exactly once and positions the progress cursor at
    /// step 1. Re-attempts after a retry do not pass through here again.
    pub fn begin(&mut self) -> Result<()> {
        if self.status != JobStatus::Queued {
            return Err(RankForgeError::StateTransition(format!(
                "cannot begin job {} from status {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
        self.step = 1;
        Ok(())
    }

    /// `processing → processing`: a progress callback fired.
    pub fn record_progress(&mut self, step: u32, total_steps: u32, step_name: &str) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(RankForgeError::StateTransition(format!(
                "cannot record progress for job {} in status {}",
                self.id, self.status
            )));
        }
        // Progress never moves backwards within a record.
        self.step = self.step.max(step);
        self.total_steps = total_steps;
        self.step_name = Some(step_name.to_string());
        Ok(())
    }

    /// `processing → completed`: the work function resolved.
    pub fn complete(&mut self, result: serde_json::Value) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(RankForgeError::StateTransition(format!(
                "cannot complete job {} from status {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// `processing → failed`: retry budget exhausted or terminal failure.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(RankForgeError::StateTransition(format!(
                "cannot fail job {} from status {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Book a retry: increments `retry_count` and stamps `last_attempt_at`.
    ///
    /// The status stays `processing`; a re-attempted job is not a distinct
    /// state, it is the same record looping back through execution.
    pub fn schedule_retry(&mut self) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(RankForgeError::StateTransition(format!(
                "cannot schedule retry for job {} in status {}",
                self.id, self.status
            )));
        }
        if self.retry_count >= self.max_retries {
            return Err(RankForgeError::StateTransition(format!(
                "retry budget exhausted for job {} ({}/{})",
                self.id, self.retry_count, self.max_retries
            )));
        }
        self.retry_count += 1;
        self.last_attempt_at = Some(Utc::now());
        Ok(())
    }
}
