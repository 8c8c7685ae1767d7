#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # RankForge Core
//!
//! Rust core of the RankForge content-optimization platform: a durable,
//! retryable job orchestration layer that runs long SEO/AEO article
//! generation pipelines outside the request/response cycle.
//!
//! ## Overview
//!
//! Generating and scoring an optimized article takes minutes: SERP
//! retrieval, LLM drafting, scoring passes, schema generation, publishing.
//! The core accepts a job, acknowledges immediately with a job id, and
//! drives the pipeline in the background with exponential-backoff retries
//! while clients poll a cheap status endpoint. Per-dependency circuit
//! breakers keep a struggling search, LLM or publish API from being hammered
//! by every in-flight job at once.
//!
//! ## Module Organization
//!
//! - [`jobs`] - job records, the persistent store, and the orchestrator
//! - [`resilience`] - per-dependency circuit breakers
//! - [`web`] - the axum submission/status surface
//! - [`config`] - environment-driven configuration
//! - [`logging`] - structured tracing setup
//! - [`error`] - crate-wide error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rankforge_core::jobs::{JobQueue, MemoryJobStore, QueueConfig};
//! use rankforge_core::resilience::CircuitBreakerRegistry;
//! use rankforge_core::web::{build_router, AppState};
//! use std::sync::Arc;
//!
//! # use rankforge_core::jobs::{ContentPipeline, PipelineError, ProgressHandle, JobRequest};
//! # struct MyPipeline;
//! # #[async_trait::async_trait]
//! # impl ContentPipeline for MyPipeline {
//! #     async fn run(&self, _r: &JobRequest, _p: ProgressHandle)
//! #         -> Result<serde_json::Value, PipelineError> { Ok(serde_json::json!({})) }
//! # }
//! # async fn example() {
//! let store = Arc::new(MemoryJobStore::new());
//! let queue = Arc::new(JobQueue::new(store, Arc::new(MyPipeline), QueueConfig::default()));
//! let breakers = Arc::new(CircuitBreakerRegistry::with_defaults());
//! let app = build_router(AppState::new(queue, breakers));
//! # let _ = app;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod resilience;
pub mod web;

pub use config::RankForgeConfig;
pub use error::{RankForgeError, Result};
pub use jobs::{JobQueue, JobRecord, JobStatus, JobStore, MemoryJobStore, QueueConfig};
pub use resilience::{BreakerConfig, CircuitBreakerRegistry, CircuitState};
