//! # Configuration
//!
//! Environment-driven configuration with coded defaults. `RANKFORGE_*`
//! variables override; parse failures are configuration errors rather than
//! silent fallbacks.

use crate::error::{RankForgeError, Result};
use crate::jobs::queue::{BackoffPolicy, QueueConfig};

#[derive(Debug, Clone)]
pub struct RankForgeConfig {
    /// Address the HTTP surface binds to
    pub bind_address: String,
    /// Postgres connection string for the durable job store; `None` runs on
    /// the in-memory store (development only)
    pub database_url: Option<String>,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_jitter_ms: u64,
}

impl Default for RankForgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8088".to_string(),
            database_url: None,
            max_retries: 5,
            backoff_base_ms: 1_000,
            backoff_jitter_ms: 200,
        }
    }
}

impl RankForgeConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(bind_address) = std::env::var("RANKFORGE_BIND_ADDRESS") {
            config.bind_address = bind_address;
        }

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            config.database_url = Some(database_url);
        }

        if let Ok(max_retries) = std::env::var("RANKFORGE_MAX_RETRIES") {
            config.max_retries = max_retries.parse().map_err(|e| {
                RankForgeError::Configuration(format!("Invalid max_retries: {e}"))
            })?;
        }

        if let Ok(base_ms) = std::env::var("RANKFORGE_BACKOFF_BASE_MS") {
            config.backoff_base_ms = base_ms.parse().map_err(|e| {
                RankForgeError::Configuration(format!("Invalid backoff_base_ms: {e}"))
            })?;
        }

        if let Ok(jitter_ms) = std::env::var("RANKFORGE_BACKOFF_JITTER_MS") {
            config.backoff_jitter_ms = jitter_ms.parse().map_err(|e| {
                RankForgeError::Configuration(format!("Invalid backoff_jitter_ms: {e}"))
            })?;
        }

        Ok(config)
    }

    /// Orchestrator tuning derived from this configuration.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_retries: self.max_retries,
            backoff: BackoffPolicy {
                base_delay_ms: self.backoff_base_ms,
                jitter_ms: self.backoff_jitter_ms,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RankForgeConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:8088");
        assert!(config.database_url.is_none());
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_queue_config_derivation() {
        let config = RankForgeConfig {
            max_retries: 2,
            backoff_base_ms: 500,
            backoff_jitter_ms: 50,
            ..RankForgeConfig::default()
        };
        let queue_config = config.queue_config();
        assert_eq!(queue_config.max_retries, 2);
        assert_eq!(queue_config.backoff.base_delay_ms, 500);
        assert_eq!(queue_config.backoff.jitter_ms, 50);
    }
}
