//! # Errors
//!
//! Error kinds surfaced by the reconciliation engine and its collaborators.
//!
//! Unauthorized responses are a distinct variant everywhere: a 401 is never
//! folded into an empty listing or a generic failure.

use std::path::PathBuf;
use thiserror::Error;

/// Desired-state file could not be read or is invalid.
///
/// Always fatal, and always raised before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read desired-state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse desired-state file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid entry #{index} ('{name}'): {reason}")]
    Invalid {
        index: usize,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 401 from InfluxDB or the Kubernetes API
    #[error("unauthorized to {operation}")]
    Unauthorized { operation: String },

    /// Any other failure fetching or creating an org, bucket or token
    #[error("InfluxDB failed to {operation}: {message}")]
    Directory { operation: String, message: String },

    /// Failure listing, creating or deleting a Secret
    #[error("secret store failed to {operation}: {message}")]
    SecretStore { operation: String, message: String },

    /// A reused token whose value InfluxDB no longer discloses
    #[error("token '{token}' already exists but its value cannot be retrieved")]
    SecretUnavailable { token: String },
}

impl ControllerError {
    pub fn unauthorized(operation: impl Into<String>) -> Self {
        Self::Unauthorized {
            operation: operation.into(),
        }
    }

    pub fn directory(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn secret_store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SecretStore {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Short, stable name of the error kind, used in reports and metrics labels
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Directory { .. } => "directory",
            Self::SecretStore { .. } => "secret_store",
            Self::SecretUnavailable { .. } => "secret_unavailable",
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
