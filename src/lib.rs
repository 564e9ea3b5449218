//! InfluxDB Secret Controller Library
//!
//! Converges a declared set of InfluxDB access tokens into labeled Kubernetes
//! Secrets: missing organizations, buckets, tokens and secrets are created,
//! secrets that no longer match a declared entry are deleted.
//!
//! ## Quick Start
//!
//! ```rust
//! use influxdb_secret_controller::prelude::*;
//! ```
//!
//! A run is single-pass. Callers must guarantee that at most one run per
//! deployment name is in flight: get-or-create against InfluxDB is not atomic,
//! so overlapping runs can create duplicate organizations, buckets or tokens.

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod model;
pub mod observability;
pub mod prelude;
pub mod provider;
