//! # Resilience Module
//!
//! Fault-isolation primitives for the downstream dependencies the content
//! pipelines call: SERP retrieval, LLM completion and the publish target.
//! Repeatedly-failing dependencies are cut off until a cool-down elapses
//! instead of being hammered by every in-flight job.

pub mod circuit_breaker;

pub use circuit_breaker::{
    services, BreakerConfig, BreakerSnapshot, CircuitBreakerRegistry, CircuitState,
};
