//! # Desired State
//!
//! The declared set of tokens: one entry per Secret that should exist.
//!
//! ```yaml
//! - name: telegraf
//!   org: metrics
//!   namespace: monitoring
//!   permissions: write
//!   bucket: telegraf
//! - name: grafana
//!   org: metrics
//!   namespace: monitoring
//!   permissions: read
//! ```

use crate::error::ConfigError;
use crate::model::{token_name, Action};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One requested token/Secret binding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredEntry {
    /// Secret name, also the first half of the token name
    pub name: String,
    /// InfluxDB organization the token is scoped to
    pub org: String,
    /// Namespace the Secret is created in
    pub namespace: String,
    /// Action granted across all token resource types
    pub permissions: Action,
    /// Bucket to make sure exists in the org
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl DesiredEntry {
    /// Deterministic InfluxDB token name: `{name}-{namespace}`
    #[must_use]
    pub fn token_name(&self) -> String {
        token_name(&self.name, &self.namespace)
    }
}

/// Read, parse and validate the desired-state file
pub fn load_desired_entries(path: &Path) -> Result<Vec<DesiredEntry>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_desired_entries(&content).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    debug!("Loaded {} desired entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse and validate desired-state YAML
///
/// An empty document means no entries are desired.
pub fn parse_desired_entries(content: &str) -> Result<Vec<DesiredEntry>, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<DesiredEntry>> =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: Path::new("<inline>").to_path_buf(),
            source,
        })?;
    let entries = entries.unwrap_or_default();

    for (index, entry) in entries.iter().enumerate() {
        validate_entry(entry).map_err(|reason| ConfigError::Invalid {
            index,
            name: entry.name.clone(),
            reason,
        })?;
    }

    Ok(entries)
}

fn validate_entry(entry: &DesiredEntry) -> Result<(), String> {
    validate_secret_name(&entry.name)?;
    validate_namespace(&entry.namespace)?;

    if entry.org.trim().is_empty() {
        return Err("org cannot be empty".to_string());
    }
    if let Some(bucket) = &entry.bucket {
        if bucket.trim().is_empty() {
            return Err("bucket cannot be empty when specified".to_string());
        }
    }

    Ok(())
}

/// Secret names are RFC 1123 subdomains, 1-253 characters
fn validate_secret_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }

    if name.len() > 253 {
        return Err(format!(
            "name '{name}' exceeds maximum length of 253 characters (got {})",
            name.len()
        ));
    }

    let name_regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .map_err(|e| format!("failed to compile regex: {e}"))?;

    if !name_regex.is_match(name) {
        return Err(format!(
            "name '{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"
        ));
    }

    Ok(())
}

/// Namespaces are RFC 1123 labels, 1-63 characters
fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace cannot be empty".to_string());
    }

    if namespace.len() > 63 {
        return Err(format!(
            "namespace '{namespace}' exceeds maximum length of 63 characters (got {})",
            namespace.len()
        ));
    }

    let namespace_regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .map_err(|e| format!("failed to compile regex: {e}"))?;

    if !namespace_regex.is_match(namespace) {
        return Err(format!(
            "namespace '{namespace}' must be a valid Kubernetes namespace (lowercase alphanumeric, hyphens; cannot start/end with hyphen)"
        ));
    }

    Ok(())
}
