//! HTTP surface contract tests: submission acknowledgement, status reads,
//! error bodies and health endpoints.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rankforge_core::jobs::{AlwaysRetryable, JobQueue, MemoryJobStore, QueueConfig};
use rankforge_core::resilience::CircuitBreakerRegistry;
use rankforge_core::web::{build_router, AppState};
use support::*;

fn build_app() -> (Router, Arc<JobQueue>) {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(JobQueue::with_components(
        store,
        Arc::new(StepwisePipeline { total_steps: 3 }),
        QueueConfig::default(),
        Arc::new(AlwaysRetryable),
        Arc::new(InstantScheduler),
    ));
    let breakers = Arc::new(CircuitBreakerRegistry::with_defaults());
    let app = build_router(AppState::new(queue.clone(), breakers));
    (app, queue)
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_jobs(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/jobs")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn submit_acknowledges_with_202() {
    let (app, _queue) = build_app();

    let payload = generate_payload("standing desks", "req-42");
    let response = app
        .oneshot(post_jobs(serde_json::to_vec(&payload).unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["status"], "queued");
    assert_eq!(body["requestId"], "req-42");
    assert!(uuid::Uuid::parse_str(body["jobId"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn malformed_submission_gets_400() {
    let (app, _queue) = build_app();

    // Missing required fields.
    let response = app
        .clone()
        .oneshot(post_jobs(
            serde_json::to_vec(&json!({ "mode": "generate" })).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("keyword"));

    // Unparseable body.
    let response = app
        .oneshot(post_jobs(b"{not json".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("valid JSON"));
}

#[tokio::test]
async fn status_read_by_path_returns_full_record() {
    let (app, queue) = build_app();

    let ack = queue
        .submit(generate_payload("standing desks", "req-1"))
        .await
        .unwrap();
    let record = queue
        .wait_for_terminal(ack.job_id, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(record.status.to_string(), "completed");

    let response = app
        .oneshot(get(&format!("/v1/jobs/{}", ack.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["id"], ack.job_id.to_string());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["requestId"], "req-1");
    assert_eq!(body["step"], 3);
    assert_eq!(body["totalSteps"], 3);
    assert_eq!(body["result"]["html"], "<p>ok</p>");
    assert!(body["createdAt"].is_i64());
    assert!(body["completedAt"].is_i64());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn status_read_by_query_param() {
    let (app, queue) = build_app();

    let ack = queue
        .submit(generate_payload("standing desks", "req-1"))
        .await
        .unwrap();

    let response = app
        .oneshot(get(&format!("/v1/jobs?jobId={}", ack.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["id"], ack.job_id.to_string());
}

#[tokio::test]
async fn status_read_without_id_is_400() {
    let (app, _queue) = build_app();

    let response = app.oneshot(get("/v1/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "jobId required");
}

#[tokio::test]
async fn unknown_job_is_404() {
    let (app, _queue) = build_app();

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/jobs/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "job not found");

    // Garbage ids can't name a job either.
    let response = app.oneshot(get("/v1/jobs/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (app, _queue) = build_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");

    let response = app.oneshot(get("/health/breakers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let breakers = body["breakers"].as_array().unwrap();
    assert_eq!(breakers.len(), 3);
    assert!(breakers.iter().all(|b| b["status"] == "closed"));
}
