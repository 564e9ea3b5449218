//! # Diff Engine
//!
//! Pure comparison of desired entries against the observed Secrets.
//!
//! An observed Secret satisfies a desired entry when name and namespace are
//! equal. Each observed Secret satisfies at most one entry and each entry is
//! satisfied at most once, so the result is a partition:
//! `|desired| = |needed| + |observed| - |stale|`.
//!
//! Matching never looks at the token value or permissions. A Secret whose
//! token was revoked out-of-band still counts as satisfying its entry.

use crate::config::DesiredEntry;
use crate::model::ObservedSecret;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of comparing desired against observed state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Desired entries with no corresponding Secret, in desired order
    pub needed: Vec<DesiredEntry>,
    /// Observed Secrets with no corresponding entry, in observed order
    pub stale: Vec<ObservedSecret>,
}

impl Diff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needed.is_empty() && self.stale.is_empty()
    }
}

/// Compute the entries to create and the Secrets to delete
#[must_use]
pub fn diff(desired: &[DesiredEntry], observed: &[ObservedSecret]) -> Diff {
    let mut satisfied = vec![false; desired.len()];
    let mut stale = Vec::new();

    for secret in observed {
        let matched = desired
            .iter()
            .zip(&satisfied)
            .position(|(entry, done)| {
                !done && entry.name == secret.name && entry.namespace == secret.namespace
            });

        if let Some(index) = matched {
            satisfied[index] = true;
            debug!(
                "Secret {}/{} is already in the desired state",
                secret.namespace, secret.name
            );
        } else {
            info!(
                "Secret {}/{} is no longer desired",
                secret.namespace, secret.name
            );
            stale.push(secret.clone());
        }
    }

    let needed = desired
        .iter()
        .zip(&satisfied)
        .filter(|(_, done)| !**done)
        .map(|(entry, _)| entry.clone())
        .collect();

    Diff { needed, stale }
}

/// Drop repeated (name, namespace) entries, keeping the first occurrence
///
/// Returns the kept entries and the dropped duplicates, both in input order.
#[must_use]
pub fn dedupe_desired(entries: &[DesiredEntry]) -> (Vec<DesiredEntry>, Vec<DesiredEntry>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());
    let mut duplicates = Vec::new();

    for entry in entries {
        if seen.insert((entry.name.as_str(), entry.namespace.as_str())) {
            kept.push(entry.clone());
        } else {
            warn!(
                "Ignoring duplicate desired entry {}/{} (org {})",
                entry.namespace, entry.name, entry.org
            );
            duplicates.push(entry.clone());
        }
    }

    (kept, duplicates)
}
