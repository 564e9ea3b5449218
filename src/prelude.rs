//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use influxdb_secret_controller::prelude::*;
//! ```

// Domain model
pub use crate::model::{Action, Bucket, ObservedSecret, Org, Token};

// Provider traits and implementations
pub use crate::provider::influxdb::InfluxClient;
pub use crate::provider::kubernetes::KubeSecretStore;
pub use crate::provider::{DirectoryClient, NewSecret, SecretStore, TokenRequest};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    run, EntryFailure, FailureStage, ReconcileOptions, Reconciler, RunReport,
};

// Config types
pub use crate::config::{load_desired_entries, ControllerConfig, DesiredEntry};

// Error types
pub use crate::error::{ConfigError, ControllerError};
