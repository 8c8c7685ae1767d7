//! # Circuit Breaker Registry
//!
//! Per-dependency admission gating with the classic three-state breaker:
//! Closed (normal operation), Open (failing fast), and Half-Open (testing
//! recovery). The registry is advisory; pipelines consult it before calling
//! a named dependency and report outcomes back; the orchestrator never gates
//! job submission on it.
//!
//! Breaker state is a liveness optimization, not a correctness guarantee,
//! so it is process-local and resets on restart.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation - all calls are admitted
    Closed,
    /// Failure mode - calls are refused until the recovery timeout elapses
    Open,
    /// Testing recovery - probe calls are admitted
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Per-service breaker thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that trip `closed → open`
    pub failure_threshold: u32,
    /// Cool-down before an open breaker admits a probe
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(10),
        }
    }
}

/// Stable dependency names tracked by the reference deployment.
pub mod services {
    /// SERP retrieval API
    pub const SEARCH_PROVIDER: &str = "search-provider";
    /// LLM completion API
    pub const AI_PROVIDER: &str = "ai-provider";
    /// WordPress publishing endpoint
    pub const PUBLISH_TARGET: &str = "publish-target";
}

#[derive(Debug)]
struct ServiceBreaker {
    status: CircuitState,
    /// Consecutive failures since the last reset
    failure_count: u32,
    last_failure_at: Option<Instant>,
    config: BreakerConfig,
}

impl ServiceBreaker {
    fn new(config: BreakerConfig) -> Self {
        Self {
            status: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
            config,
        }
    }
}

/// Read-only view of one breaker, for health surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub service: String,
    pub status: CircuitState,
    pub failure_count: u32,
}

/// Registry of named per-dependency circuit breakers.
///
/// Created once at orchestrator startup with static per-service thresholds.
/// Unknown service names are always admitted; missing configuration fails
/// open rather than blocking calls.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, ServiceBreaker>,
}

impl CircuitBreakerRegistry {
    /// Empty registry; register services explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the reference per-service thresholds.
    ///
    /// Tolerance decreases as the downstream cost of repeated failure
    /// increases: a redundant search is cheap, a duplicate publish is not.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(
            services::SEARCH_PROVIDER,
            BreakerConfig {
                failure_threshold: 5,
                recovery_timeout: Duration::from_secs(10),
            },
        );
        registry.register(
            services::AI_PROVIDER,
            BreakerConfig {
                failure_threshold: 3,
                recovery_timeout: Duration::from_secs(30),
            },
        );
        registry.register(
            services::PUBLISH_TARGET,
            BreakerConfig {
                failure_threshold: 2,
                recovery_timeout: Duration::from_secs(5),
            },
        );
        registry
    }

    /// Register (or replace) a breaker for a named service.
    pub fn register(&self, service: impl Into<String>, config: BreakerConfig) {
        let service = service.into();
        info!(
            service = %service,
            failure_threshold = config.failure_threshold,
            recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
            "🛡️ Circuit breaker registered"
        );
        self.breakers.insert(service, ServiceBreaker::new(config));
    }

    /// Should a call to this service be admitted right now?
    ///
    /// An open breaker whose recovery timeout has elapsed transitions to
    /// half-open as a side effect of granting admission. Unregistered
    /// services are always admitted.
    pub fn is_admitted(&self, service: &str) -> bool {
        let Some(mut breaker) = self.breakers.get_mut(service) else {
            return true;
        };
        match breaker.status {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = match breaker.last_failure_at {
                    Some(at) => at.elapsed() > breaker.config.recovery_timeout,
                    // Open with no failure timestamp shouldn't happen; admit.
                    None => true,
                };
                if cooled_down {
                    breaker.status = CircuitState::HalfOpen;
                    info!(service = %service, "🟡 Circuit breaker half-open (probing recovery)");
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful dependency call. A single success fully closes
    /// the breaker, including from half-open.
    pub fn record_success(&self, service: &str) {
        let Some(mut breaker) = self.breakers.get_mut(service) else {
            return;
        };
        if breaker.status != CircuitState::Closed {
            info!(service = %service, "🟢 Circuit breaker closed (recovered)");
        }
        breaker.failure_count = 0;
        breaker.status = CircuitState::Closed;
    }

    /// Record a failed dependency call.
    ///
    /// Trips `closed → open` at the failure threshold. A failure observed
    /// while half-open re-opens immediately; a failed probe means the
    /// dependency is still unhealthy, regardless of the counter.
    pub fn record_failure(&self, service: &str) {
        let Some(mut breaker) = self.breakers.get_mut(service) else {
            return;
        };
        breaker.failure_count += 1;
        breaker.last_failure_at = Some(Instant::now());

        let tripped = breaker.status == CircuitState::HalfOpen
            || breaker.failure_count >= breaker.config.failure_threshold;
        if tripped && breaker.status != CircuitState::Open {
            breaker.status = CircuitState::Open;
            warn!(
                service = %service,
                failure_count = breaker.failure_count,
                failure_threshold = breaker.config.failure_threshold,
                "🔴 Circuit breaker opened (failing fast)"
            );
        }
    }

    /// Current state of a named breaker, if registered.
    pub fn state(&self, service: &str) -> Option<CircuitState> {
        self.breakers.get(service).map(|breaker| breaker.status)
    }

    /// Snapshot of every registered breaker, sorted by service name.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> = self
            .breakers
            .iter()
            .map(|entry| BreakerSnapshot {
                service: entry.key().clone(),
                status: entry.status,
                failure_count: entry.failure_count,
            })
            .collect();
        snapshots.sort_by(|a, b| a.service.cmp(&b.service));
        snapshots
    }
}
