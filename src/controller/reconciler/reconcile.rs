//! # Reconciliation Logic
//!
//! One pass of the convergence algorithm:
//!
//! 1. Drop duplicate desired entries (first occurrence wins)
//! 2. List the Secrets owned by this deployment
//! 3. Diff desired against observed
//! 4. Fetch the InfluxDB inventory, only if there is work that needs it
//! 5. Delete stale Secrets (and their tokens, when revocation is enabled)
//! 6. For each needed entry: resolve org, bucket and token, then create the Secret
//!
//! Listing failures in steps 2 and 4 abort the run. Everything after that is
//! per entry: a failure is recorded in the [`RunReport`] and the run moves on.
//! Nothing is retried within a run; the next scheduled run retries.

use crate::config::{load_desired_entries, ControllerConfig, DesiredEntry};
use crate::controller::reconciler::diff::{dedupe_desired, diff, Diff};
use crate::controller::reconciler::inventory::{fetch_inventory, DirectoryState};
use crate::controller::reconciler::resolver::{Resolver, TokenOutcome};
use crate::controller::reconciler::types::{FailureStage, ReconcileOptions, RunReport};
use crate::error::ControllerError;
use crate::model::{token_name, ObservedSecret};
use crate::observability::metrics;
use crate::provider::{DirectoryClient, NewSecret, SecretStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Drives a run against one directory and one secret store
///
/// Runs for the same deployment must not overlap; nothing here locks.
pub struct Reconciler {
    directory: Arc<dyn DirectoryClient>,
    store: Arc<dyn SecretStore>,
    options: ReconcileOptions,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        store: Arc<dyn SecretStore>,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            directory,
            store,
            options,
        }
    }

    /// Compute what a run would change, without touching either side
    pub async fn plan(&self, desired: &[DesiredEntry]) -> Result<Diff, ControllerError> {
        let (desired, _) = dedupe_desired(desired);
        let observed = self.store.list_secrets().await?;
        Ok(diff(&desired, &observed))
    }

    /// Converge InfluxDB and the secret store toward `desired`
    ///
    /// Returns `Err` only when listing Secrets or the InfluxDB inventory
    /// fails; per-entry failures land in the report.
    pub async fn reconcile(&self, desired: &[DesiredEntry]) -> Result<RunReport, ControllerError> {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let result = self
            .reconcile_internal(desired)
            .instrument(info_span!("pass", entries = desired.len()))
            .await;

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        match &result {
            Ok(report) => {
                for failure in &report.failures {
                    metrics::increment_entry_failures(failure.error.kind());
                }
            }
            Err(e) => {
                metrics::increment_reconciliation_errors();
                error!("Reconciliation aborted: {e}");
            }
        }

        result
    }

    async fn reconcile_internal(
        &self,
        desired: &[DesiredEntry],
    ) -> Result<RunReport, ControllerError> {
        let mut report = RunReport::new();

        let (desired, duplicates) = dedupe_desired(desired);
        report.duplicates_dropped = duplicates.len();

        let observed = self.store.list_secrets().await?;
        let Diff { needed, stale } = diff(&desired, &observed);
        info!(
            "{} desired, {} observed: {} to create, {} to delete",
            desired.len(),
            observed.len(),
            needed.len(),
            stale.len()
        );

        let needs_inventory =
            !needed.is_empty() || (self.options.revoke_stale_tokens && !stale.is_empty());
        let mut state = if needs_inventory {
            fetch_inventory(self.directory.as_ref()).await?
        } else {
            debug!("Nothing requires InfluxDB, skipping inventory");
            DirectoryState::default()
        };

        for secret in &stale {
            self.remove_stale(secret, &mut state, &mut report)
                .instrument(info_span!(
                    "stale",
                    name = %secret.name,
                    namespace = %secret.namespace
                ))
                .await;
        }

        let mut resolver = Resolver::new(self.directory.as_ref(), &mut state);
        for entry in &needed {
            self.converge_entry(&mut resolver, entry, &mut report)
                .instrument(info_span!(
                    "entry",
                    name = %entry.name,
                    namespace = %entry.namespace
                ))
                .await;
        }

        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    async fn remove_stale(
        &self,
        secret: &ObservedSecret,
        state: &mut DirectoryState,
        report: &mut RunReport,
    ) {
        if let Err(e) = self
            .store
            .delete_secret(&secret.name, &secret.namespace)
            .await
        {
            error!("Failed to delete stale Secret: {e}");
            report.record_failure(FailureStage::DeleteSecret, &secret.name, &secret.namespace, e);
            return;
        }
        info!("Deleted stale Secret");
        report.secrets_deleted += 1;
        metrics::increment_secrets_deleted();

        if !self.options.revoke_stale_tokens {
            return;
        }

        let name = token_name(&secret.name, &secret.namespace);
        let Some(token) = state.find_token_by_name(&name).cloned() else {
            debug!("No token named {name} to revoke");
            return;
        };

        match self.directory.delete_token(&token).await {
            Ok(()) => {
                info!("Revoked token {name} in org {}", token.org_name);
                state.remove_token(&token.id);
                report.tokens_revoked += 1;
            }
            Err(e) => {
                error!("Failed to revoke token {name}: {e}");
                report.record_failure(FailureStage::RevokeToken, &secret.name, &secret.namespace, e);
            }
        }
    }

    async fn converge_entry(
        &self,
        resolver: &mut Resolver<'_>,
        entry: &DesiredEntry,
        report: &mut RunReport,
    ) {
        let resolution = match resolver.resolve(entry).await {
            Ok(resolution) => resolution,
            Err(e) => {
                error!("Failed to resolve token: {e}");
                report.record_failure(FailureStage::Resolve, &entry.name, &entry.namespace, e);
                return;
            }
        };

        if resolution.org_created {
            report.orgs_created += 1;
        }
        if resolution.bucket_created {
            report.buckets_created += 1;
        }
        match resolution.outcome {
            TokenOutcome::Created => {
                report.tokens_created += 1;
                metrics::increment_tokens_created();
            }
            TokenOutcome::Reused => {
                report.tokens_reused += 1;
                metrics::increment_tokens_reused();
            }
        }

        let token_value = match resolution.secret_value() {
            Ok(value) => value.to_string(),
            Err(e) => {
                warn!("Skipping Secret: {e}");
                metrics::increment_entries_skipped();
                report.record_skip(&entry.name, &entry.namespace, e);
                return;
            }
        };

        let secret = NewSecret {
            name: entry.name.clone(),
            namespace: entry.namespace.clone(),
            token_value,
        };
        match self.store.create_secret(&secret).await {
            Ok(()) => {
                info!("Created Secret for token {}", resolution.token.name);
                report.secrets_created += 1;
                metrics::increment_secrets_created();
            }
            Err(e) => {
                error!("Failed to create Secret: {e}");
                report.record_failure(FailureStage::CreateSecret, &entry.name, &entry.namespace, e);
            }
        }
    }
}

/// Load the desired state and run one reconciliation
///
/// The desired-state file is read before any network call, so a
/// [`ConfigError`](crate::error::ConfigError) leaves both sides untouched.
pub async fn run(
    config: &ControllerConfig,
    directory: Arc<dyn DirectoryClient>,
    store: Arc<dyn SecretStore>,
) -> Result<RunReport, ControllerError> {
    let desired = load_desired_entries(&config.config_path)?;
    info!(
        "Reconciling {} desired entries from {}",
        desired.len(),
        config.config_path.display()
    );

    let options = ReconcileOptions {
        revoke_stale_tokens: config.revoke_stale_tokens,
    };
    Reconciler::new(directory, store, options)
        .reconcile(&desired)
        .instrument(info_span!("reconcile", deployment = %config.deployment_name))
        .await
}
