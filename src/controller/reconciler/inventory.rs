//! # Directory Inventory
//!
//! Snapshot of InfluxDB orgs, buckets and tokens taken once per run.
//!
//! The resolver reads from and appends to this cache so repeated entries in
//! the same run reuse what earlier entries created instead of re-listing.

use crate::error::ControllerError;
use crate::model::{Bucket, Org, Token};
use crate::provider::DirectoryClient;
use std::collections::HashMap;
use tracing::debug;

/// Orgs, buckets (keyed by org id) and tokens known for this run
#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    orgs: Vec<Org>,
    buckets: HashMap<String, Vec<Bucket>>,
    tokens: Vec<Token>,
}

impl DirectoryState {
    #[must_use]
    pub fn new(orgs: Vec<Org>, buckets: Vec<Bucket>, tokens: Vec<Token>) -> Self {
        let mut state = Self {
            orgs,
            buckets: HashMap::new(),
            tokens,
        };
        for bucket in buckets {
            state.add_bucket(bucket);
        }
        state
    }

    #[must_use]
    pub fn orgs(&self) -> &[Org] {
        &self.orgs
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn find_org(&self, name: &str) -> Option<&Org> {
        self.orgs.iter().find(|org| org.name == name)
    }

    pub fn add_org(&mut self, org: Org) {
        self.orgs.push(org);
    }

    #[must_use]
    pub fn find_bucket(&self, org: &Org, name: &str) -> Option<&Bucket> {
        self.buckets
            .get(&org.id)
            .and_then(|buckets| buckets.iter().find(|bucket| bucket.name == name))
    }

    pub fn add_bucket(&mut self, bucket: Bucket) {
        self.buckets
            .entry(bucket.org_id.clone())
            .or_default()
            .push(bucket);
    }

    /// Find a reusable token for an entry
    ///
    /// Name and org id must match, and so must the bucket: an entry naming a
    /// bucket only matches a token scoped to that bucket, an entry without
    /// one only matches a token without a bucket reference.
    #[must_use]
    pub fn find_token(&self, name: &str, org: &Org, bucket: Option<&str>) -> Option<&Token> {
        self.tokens.iter().find(|token| {
            token.name == name
                && token.org_id == org.id
                && match (&token.bucket, bucket) {
                    (Some(scoped), Some(wanted)) => scoped.name == wanted,
                    (None, None) => true,
                    _ => false,
                }
        })
    }

    /// First token carrying `name`, in any org
    #[must_use]
    pub fn find_token_by_name(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.name == name)
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remove_token(&mut self, id: &str) {
        self.tokens.retain(|token| token.id != id);
    }
}

/// List orgs, then the buckets of each org, then tokens
pub async fn fetch_inventory(
    directory: &dyn DirectoryClient,
) -> Result<DirectoryState, ControllerError> {
    let orgs = directory.list_orgs().await?;

    let mut buckets = Vec::new();
    for org in &orgs {
        buckets.extend(directory.list_buckets(org).await?);
    }

    let tokens = directory.list_tokens().await?;

    debug!(
        "Fetched InfluxDB inventory: {} orgs, {} buckets, {} tokens",
        orgs.len(),
        buckets.len(),
        tokens.len()
    );

    Ok(DirectoryState::new(orgs, buckets, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: &str, name: &str) -> Org {
        Org {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn bucket(id: &str, name: &str, org_id: &str) -> Bucket {
        Bucket {
            id: id.to_string(),
            name: name.to_string(),
            org_id: org_id.to_string(),
        }
    }

    fn token(id: &str, name: &str, org_id: &str, scoped: Option<Bucket>) -> Token {
        Token {
            id: id.to_string(),
            name: name.to_string(),
            org_id: org_id.to_string(),
            org_name: String::new(),
            bucket: scoped,
            permission: "read".to_string(),
            value: None,
        }
    }

    #[test]
    fn test_buckets_are_scoped_to_their_org() {
        let state = DirectoryState::new(
            vec![org("o1", "one"), org("o2", "two")],
            vec![bucket("b1", "metrics", "o1")],
            Vec::new(),
        );

        assert!(state.find_bucket(&org("o1", "one"), "metrics").is_some());
        assert!(state.find_bucket(&org("o2", "two"), "metrics").is_none());
    }

    #[test]
    fn test_find_token_matches_org_by_id() {
        let state = DirectoryState::new(
            vec![org("o1", "one"), org("o2", "two")],
            Vec::new(),
            vec![token("t1", "a-ns1", "o1", None)],
        );

        assert!(state.find_token("a-ns1", &org("o1", "one"), None).is_some());
        assert!(state.find_token("a-ns1", &org("o2", "two"), None).is_none());
        assert!(state.find_token("b-ns1", &org("o1", "one"), None).is_none());
    }

    #[test]
    fn test_org_wide_token_does_not_match_bucket_entry() {
        let state = DirectoryState::new(
            vec![org("o1", "one")],
            Vec::new(),
            vec![token("t1", "a-ns1", "o1", None)],
        );
        let one = org("o1", "one");

        assert!(state.find_token("a-ns1", &one, Some("metrics")).is_none());
        assert!(state.find_token("a-ns1", &one, None).is_some());
    }

    #[test]
    fn test_bucket_scoped_token_needs_same_bucket() {
        let scoped = bucket("b1", "metrics", "o1");
        let state = DirectoryState::new(
            vec![org("o1", "one")],
            vec![scoped.clone()],
            vec![token("t1", "a-ns1", "o1", Some(scoped))],
        );
        let one = org("o1", "one");

        assert!(state.find_token("a-ns1", &one, Some("metrics")).is_some());
        assert!(state.find_token("a-ns1", &one, Some("logs")).is_none());
        assert!(state.find_token("a-ns1", &one, None).is_none());
    }

    #[test]
    fn test_remove_token_by_id() {
        let mut state = DirectoryState::default();
        state.add_token(token("t1", "a-ns1", "o1", None));
        state.add_token(token("t2", "b-ns1", "o1", None));

        state.remove_token("t1");

        assert!(state.find_token_by_name("a-ns1").is_none());
        assert_eq!(state.tokens().len(), 1);
    }
}
