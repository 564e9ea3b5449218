//! # Provider Modules
//!
//! The two external systems a run talks to:
//! - [`DirectoryClient`]: InfluxDB organizations, buckets and tokens
//! - [`SecretStore`]: labeled Secrets previously issued by this controller
//!
//! Neither side contains diff logic; the reconciler decides what to call.

use crate::error::ControllerError;
use crate::model::{Action, Bucket, ObservedSecret, Org, Token};
use async_trait::async_trait;

/// Parameters for a new InfluxDB token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Stored as the authorization description
    pub name: String,
    pub org: Org,
    /// Granted across every token resource type of the org
    pub action: Action,
}

/// A Secret to create in the store
#[derive(Clone)]
pub struct NewSecret {
    pub name: String,
    pub namespace: String,
    pub token_value: String,
}

impl std::fmt::Debug for NewSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewSecret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("token_value", &"***")
            .finish()
    }
}

/// Get-or-create access to InfluxDB resources
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List every organization visible to the API token
    async fn list_orgs(&self) -> Result<Vec<Org>, ControllerError>;

    async fn create_org(&self, name: &str) -> Result<Org, ControllerError>;

    /// List the buckets of one organization
    async fn list_buckets(&self, org: &Org) -> Result<Vec<Bucket>, ControllerError>;

    async fn create_bucket(&self, org: &Org, name: &str) -> Result<Bucket, ControllerError>;

    /// List every authorization visible to the API token
    async fn list_tokens(&self) -> Result<Vec<Token>, ControllerError>;

    /// Create a token; the returned token carries its freshly issued value
    async fn create_token(&self, request: &TokenRequest) -> Result<Token, ControllerError>;

    async fn delete_token(&self, token: &Token) -> Result<(), ControllerError>;
}

/// Labeled Secret records owned by one deployment
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Complete snapshot of the Secrets owned by this deployment
    async fn list_secrets(&self) -> Result<Vec<ObservedSecret>, ControllerError>;

    /// Create a Secret carrying the ownership labels and the token value
    async fn create_secret(&self, secret: &NewSecret) -> Result<(), ControllerError>;

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), ControllerError>;
}

pub mod influxdb;
pub mod kubernetes;
