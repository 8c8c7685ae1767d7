//! # Job Submission and Status Handlers
//!
//! The two client-facing operations: submit a generation/refresh job
//! (202 + acknowledgement, execution continues in the background) and poll a
//! job's status by id. Failed jobs surface only through polling; there is
//! no synchronous failure channel once a submission is accepted.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::jobs::queue::SubmitAck;
use crate::jobs::record::JobRecord;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Create a new job: POST /v1/jobs
///
/// Returns 202 with `{jobId, status, requestId}`; the caller polls for the
/// outcome. Malformed bodies get a 400 without creating a record.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SubmitAck>)> {
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("request body must be valid JSON: {err}")))?;

    let ack = state.queue.submit(payload).await.map_err(|err| {
        let api_err = ApiError::from(err);
        if matches!(api_err, ApiError::ServiceUnavailable | ApiError::Internal) {
            error!(error = %api_err, "Job submission failed");
        }
        api_err
    })?;

    Ok((StatusCode::ACCEPTED, Json(ack)))
}

/// Get job status: GET /v1/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    lookup_job(&state, &job_id).await.map(Json)
}

/// Query parameters for the query-string form of the status read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusQuery {
    pub job_id: Option<String>,
}

/// Get job status: GET /v1/jobs?jobId=...
pub async fn get_job_by_query(
    State(state): State<AppState>,
    Query(query): Query<JobStatusQuery>,
) -> ApiResult<Json<JobRecord>> {
    let job_id = query
        .job_id
        .ok_or_else(|| ApiError::bad_request("jobId required"))?;
    lookup_job(&state, &job_id).await.map(Json)
}

async fn lookup_job(state: &AppState, raw_id: &str) -> ApiResult<JobRecord> {
    // An unparseable id can't name any job; same outcome as an unknown one.
    let id = Uuid::parse_str(raw_id).map_err(|_| ApiError::NotFound)?;
    match state.queue.get_job(id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(ApiError::NotFound),
        Err(err) => {
            error!(job_id = %id, error = %err, "Status read failed");
            Err(ApiError::ServiceUnavailable)
        }
    }
}
