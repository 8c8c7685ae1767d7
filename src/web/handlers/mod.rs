//! HTTP handler implementations, grouped by resource.

pub mod health;
pub mod jobs;
