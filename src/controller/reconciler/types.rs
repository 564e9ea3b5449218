//! # Reconciler Types
//!
//! Options and the per-run report.

use crate::error::ControllerError;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Delete the matching InfluxDB token after deleting a stale Secret
    pub revoke_stale_tokens: bool,
}

/// Step at which a single entry or stale Secret failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    DeleteSecret,
    RevokeToken,
    Resolve,
    CreateSecret,
}

impl FailureStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::DeleteSecret => "delete_secret",
            FailureStage::RevokeToken => "revoke_token",
            FailureStage::Resolve => "resolve",
            FailureStage::CreateSecret => "create_secret",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Secret that could not be brought to the desired state this run
#[derive(Debug)]
pub struct EntryFailure {
    pub stage: FailureStage,
    pub name: String,
    pub namespace: String,
    pub error: ControllerError,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}): {}",
            self.namespace, self.name, self.stage, self.error
        )
    }
}

/// What a single run did
///
/// `skipped` holds entries whose token already existed without a retrievable
/// value; they are retried on every run and are not counted as failures.
#[derive(Debug, Default)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duplicates_dropped: usize,
    pub orgs_created: usize,
    pub buckets_created: usize,
    pub tokens_created: usize,
    pub tokens_reused: usize,
    pub tokens_revoked: usize,
    pub secrets_created: usize,
    pub secrets_deleted: usize,
    pub skipped: Vec<EntryFailure>,
    pub failures: Vec<EntryFailure>,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn record_failure(
        &mut self,
        stage: FailureStage,
        name: &str,
        namespace: &str,
        error: ControllerError,
    ) {
        self.failures.push(EntryFailure {
            stage,
            name: name.to_string(),
            namespace: namespace.to_string(),
            error,
        });
    }

    pub fn record_skip(&mut self, name: &str, namespace: &str, error: ControllerError) {
        self.skipped.push(EntryFailure {
            stage: FailureStage::CreateSecret,
            name: name.to_string(),
            namespace: namespace.to_string(),
            error,
        });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "secrets created={} deleted={}, tokens created={} reused={} revoked={}, orgs created={}, buckets created={}, skipped={}, failed={}",
            self.secrets_created,
            self.secrets_deleted,
            self.tokens_created,
            self.tokens_reused,
            self.tokens_revoked,
            self.orgs_created,
            self.buckets_created,
            self.skipped.len(),
            self.failures.len()
        )
    }
}
