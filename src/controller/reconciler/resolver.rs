//! # Resolver
//!
//! Get-or-create for the InfluxDB side of one desired entry:
//! org, then bucket (when named), then token.
//!
//! Lookups go through the run's [`DirectoryState`]; everything created is
//! appended to it so later entries see it. Orgs and buckets are never deleted.

use crate::config::DesiredEntry;
use crate::controller::reconciler::inventory::DirectoryState;
use crate::error::ControllerError;
use crate::model::{Org, Token};
use crate::provider::{DirectoryClient, TokenRequest};
use tracing::{debug, info, warn};

/// Whether the token was issued in this run or found in InfluxDB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOutcome {
    Created,
    Reused,
}

/// The token backing one entry, plus what had to be created for it
#[derive(Debug, Clone)]
pub struct Resolution {
    pub token: Token,
    pub outcome: TokenOutcome,
    pub org_created: bool,
    pub bucket_created: bool,
}

impl Resolution {
    /// The token value to store in the Secret
    ///
    /// Reused tokens only carry a value when the listing disclosed it.
    pub fn secret_value(&self) -> Result<&str, ControllerError> {
        self.token
            .value
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ControllerError::SecretUnavailable {
                token: self.token.name.clone(),
            })
    }
}

pub struct Resolver<'a> {
    directory: &'a dyn DirectoryClient,
    state: &'a mut DirectoryState,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    pub fn new(directory: &'a dyn DirectoryClient, state: &'a mut DirectoryState) -> Self {
        Self { directory, state }
    }

    pub async fn resolve(&mut self, entry: &DesiredEntry) -> Result<Resolution, ControllerError> {
        let (org, org_created) = self.resolve_org(&entry.org).await?;

        let bucket_created = match &entry.bucket {
            Some(name) => self.resolve_bucket(&org, name).await?,
            None => false,
        };

        let name = entry.token_name();
        if let Some(existing) = self.state.find_token(&name, &org, entry.bucket.as_deref()) {
            warn!(
                "Token {} already exists in org {}; reusing it as-is (requested {} permission is not reconciled)",
                name, org.name, entry.permissions
            );
            return Ok(Resolution {
                token: existing.clone(),
                outcome: TokenOutcome::Reused,
                org_created,
                bucket_created,
            });
        }

        let request = TokenRequest {
            name,
            org,
            action: entry.permissions,
        };
        let token = self.directory.create_token(&request).await?;
        info!(
            "Created token {} with {} permission in org {}",
            token.name, entry.permissions, token.org_name
        );
        self.state.add_token(token.clone());

        Ok(Resolution {
            token,
            outcome: TokenOutcome::Created,
            org_created,
            bucket_created,
        })
    }

    async fn resolve_org(&mut self, name: &str) -> Result<(Org, bool), ControllerError> {
        if let Some(org) = self.state.find_org(name) {
            debug!("Org {} exists ({})", org.name, org.id);
            return Ok((org.clone(), false));
        }

        let org = self.directory.create_org(name).await?;
        info!("Created org {} ({})", org.name, org.id);
        self.state.add_org(org.clone());
        Ok((org, true))
    }

    async fn resolve_bucket(&mut self, org: &Org, name: &str) -> Result<bool, ControllerError> {
        if let Some(bucket) = self.state.find_bucket(org, name) {
            debug!("Bucket {} exists in org {}", bucket.name, org.name);
            return Ok(false);
        }

        let bucket = self.directory.create_bucket(org, name).await?;
        info!("Created bucket {} in org {}", bucket.name, org.name);
        self.state.add_bucket(bucket);
        Ok(true)
    }
}
