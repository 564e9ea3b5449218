//! # Observability
//!
//! Prometheus metrics for reconciliation runs.

pub mod metrics;
