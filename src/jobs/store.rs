//! # Persistent Job Store
//!
//! Durable keyed storage for serialized job records. The store is a passive
//! mirror: the orchestrator writes every record mutation through before
//! considering it committed, and consults the store on cold status reads.
//!
//! Records live under namespaced keys (`job:<id>`) with JSON values and no
//! secondary indexes; listing all jobs is deliberately unsupported.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::jobs::record::JobRecord;

/// Key layout for persisted job records.
pub fn job_key(id: Uuid) -> String {
    format!("job:{id}")
}

/// Errors raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key-value storage for job records, surviving process restarts.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Upsert the record under its `job:<id>` key.
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Fetch a record by job id. `None` when no record exists for the key.
    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError>;
}

/// In-process store backed by a concurrent map.
///
/// Not durable across restarts; used for tests and single-node development
/// where persistence is not required.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.entries.insert(job_key(record.id), value);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        match self.entries.get(&job_key(id)) {
            Some(entry) => Ok(Some(serde_json::from_value(entry.value().clone())?)),
            None => Ok(None),
        }
    }
}

/// PostgreSQL-backed store: one row per job in a plain key-value table.
#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rankforge_jobs (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        sqlx::query(
            r#"
            INSERT INTO rankforge_jobs (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(job_key(record.id))
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT value FROM rankforge_jobs WHERE key = $1")
                .bind(job_key(id))
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::request::JobRequest;
    use serde_json::json;

    fn sample_record() -> JobRecord {
        let request = JobRequest::from_payload(json!({
            "keyword": "meal prep containers",
            "mode": "generate",
            "requestId": "r1",
            "clientId": "c1",
        }))
        .unwrap();
        JobRecord::new(&request, 5)
    }

    #[test]
    fn test_job_key_namespacing() {
        let id = Uuid::new_v4();
        assert_eq!(job_key(id), format!("job:{id}"));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryJobStore::new();
        let mut record = sample_record();

        store.put(&record).await.unwrap();
        let fetched = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.status, record.status);

        // Upsert replaces the previous value under the same key.
        record.begin().unwrap();
        store.put(&record).await.unwrap();
        let fetched = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, record.status);
        assert_eq!(fetched.step, 1);
    }

    #[tokio::test]
    async fn test_memory_store_miss_is_none() {
        let store = MemoryJobStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
