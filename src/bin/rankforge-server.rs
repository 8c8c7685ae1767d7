//! RankForge orchestration server.
//!
//! Wires configuration, the durable job store, the circuit breaker registry
//! and the orchestrator together and serves the HTTP surface. The pipeline
//! mounted here is the local-development scaffold generator; production
//! deployments wire the full generation stack in its place.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use rankforge_core::jobs::{
    ContentPipeline, JobMode, JobQueue, JobRequest, JobStore, MemoryJobStore, PipelineError,
    PostgresJobStore, ProgressHandle,
};
use rankforge_core::resilience::CircuitBreakerRegistry;
use rankforge_core::web::{build_router, AppState};
use rankforge_core::RankForgeConfig;

/// Development pipeline: walks the canonical generation steps and emits a
/// deterministic article scaffold without calling any external provider.
struct DevPipeline;

const STEPS: [&str; 8] = [
    "serp-analysis",
    "keyword-research",
    "outline",
    "draft",
    "aeo-optimization",
    "seo-scoring",
    "schema-markup",
    "finalize",
];

#[async_trait]
impl ContentPipeline for DevPipeline {
    async fn run(
        &self,
        request: &JobRequest,
        progress: ProgressHandle,
    ) -> Result<serde_json::Value, PipelineError> {
        let total = STEPS.len() as u32;
        for (i, step_name) in STEPS.iter().enumerate() {
            progress.report(i as u32 + 1, total, *step_name).await?;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        let heading = match request.mode {
            JobMode::Generate => format!("A practical guide to {}", request.keyword),
            JobMode::Refresh => format!("{}: refreshed", request.keyword),
        };
        Ok(serde_json::json!({
            "html": format!("<h1>{heading}</h1><p>Scaffold article body.</p>"),
            "keyword": request.keyword,
            "mode": request.mode,
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rankforge_core::logging::init_logging();

    let config = RankForgeConfig::from_env().context("loading configuration")?;

    let store: Arc<dyn JobStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("connecting to job store database")?;
            PostgresJobStore::migrate(&pool)
                .await
                .context("migrating job store schema")?;
            Arc::new(PostgresJobStore::new(pool))
        }
        None => {
            info!("No DATABASE_URL set; using in-memory job store");
            Arc::new(MemoryJobStore::new())
        }
    };

    let breakers = Arc::new(CircuitBreakerRegistry::with_defaults());
    let queue = Arc::new(JobQueue::new(
        store,
        Arc::new(DevPipeline),
        config.queue_config(),
    ));

    let app = build_router(AppState::new(queue, breakers));
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(bind_address = %config.bind_address, "🚀 RankForge orchestration server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
