//! Common test utilities
//!
//! Rustls setup for the Pact tests and in-memory stand-ins for InfluxDB and
//! the Kubernetes Secret store used by the reconciler tests.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use influxdb_secret_controller::config::DesiredEntry;
use influxdb_secret_controller::error::ControllerError;
use influxdb_secret_controller::model::{Action, Bucket, ObservedSecret, Org, Token};
use influxdb_secret_controller::provider::{DirectoryClient, NewSecret, SecretStore, TokenRequest};
use std::collections::HashMap;
use std::sync::{Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it's only installed once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub fn entry(name: &str, org: &str, namespace: &str, bucket: Option<&str>) -> DesiredEntry {
    DesiredEntry {
        name: name.to_string(),
        org: org.to_string(),
        namespace: namespace.to_string(),
        permissions: Action::Read,
        bucket: bucket.map(str::to_string),
    }
}

type ErrorFactory = Box<dyn Fn() -> ControllerError + Send + Sync>;

#[derive(Default)]
struct DirectoryData {
    orgs: Vec<Org>,
    buckets: Vec<Bucket>,
    tokens: Vec<Token>,
    next_id: usize,
}

/// In-memory InfluxDB
///
/// Like the real API, listed tokens do not carry their value unless
/// `disclose_values` is set.
#[derive(Default)]
pub struct FakeDirectory {
    data: Mutex<DirectoryData>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ErrorFactory>>,
    disclose_values: bool,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disclosing_values() -> Self {
        Self {
            disclose_values: true,
            ..Self::default()
        }
    }

    pub fn with_org(self, id: &str, name: &str) -> Self {
        self.data.lock().unwrap().orgs.push(Org {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_bucket(self, id: &str, name: &str, org_id: &str) -> Self {
        self.data.lock().unwrap().buckets.push(Bucket {
            id: id.to_string(),
            name: name.to_string(),
            org_id: org_id.to_string(),
        });
        self
    }

    pub fn with_token(self, id: &str, name: &str, org_id: &str, value: &str) -> Self {
        self.data.lock().unwrap().tokens.push(Token {
            id: id.to_string(),
            name: name.to_string(),
            org_id: org_id.to_string(),
            org_name: String::new(),
            bucket: None,
            permission: "read".to_string(),
            value: Some(value.to_string()),
        });
        self
    }

    /// Make every call of `operation` fail with the produced error
    pub fn fail_on(
        self,
        operation: &str,
        error: impl Fn() -> ControllerError + Send + Sync + 'static,
    ) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), Box::new(error));
        self
    }

    /// Operations called so far, e.g. `create_org:metrics`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    pub fn orgs(&self) -> Vec<Org> {
        self.data.lock().unwrap().orgs.clone()
    }

    pub fn buckets(&self) -> Vec<Bucket> {
        self.data.lock().unwrap().buckets.clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.data.lock().unwrap().tokens.clone()
    }

    fn record(&self, operation: &str, detail: &str) -> Result<(), ControllerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation}:{detail}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }

    fn next_id(data: &mut DirectoryData, prefix: &str) -> String {
        data.next_id += 1;
        format!("{prefix}{}", data.next_id)
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_orgs(&self) -> Result<Vec<Org>, ControllerError> {
        self.record("list_orgs", "")?;
        Ok(self.orgs())
    }

    async fn create_org(&self, name: &str) -> Result<Org, ControllerError> {
        self.record("create_org", name)?;
        let mut data = self.data.lock().unwrap();
        let org = Org {
            id: Self::next_id(&mut data, "org-"),
            name: name.to_string(),
        };
        data.orgs.push(org.clone());
        Ok(org)
    }

    async fn list_buckets(&self, org: &Org) -> Result<Vec<Bucket>, ControllerError> {
        self.record("list_buckets", &org.name)?;
        Ok(self
            .buckets()
            .into_iter()
            .filter(|bucket| bucket.org_id == org.id)
            .collect())
    }

    async fn create_bucket(&self, org: &Org, name: &str) -> Result<Bucket, ControllerError> {
        self.record("create_bucket", name)?;
        let mut data = self.data.lock().unwrap();
        let bucket = Bucket {
            id: Self::next_id(&mut data, "bucket-"),
            name: name.to_string(),
            org_id: org.id.clone(),
        };
        data.buckets.push(bucket.clone());
        Ok(bucket)
    }

    async fn list_tokens(&self) -> Result<Vec<Token>, ControllerError> {
        self.record("list_tokens", "")?;
        let disclose = self.disclose_values;
        Ok(self
            .tokens()
            .into_iter()
            .map(|mut token| {
                if !disclose {
                    token.value = None;
                }
                token
            })
            .collect())
    }

    async fn create_token(&self, request: &TokenRequest) -> Result<Token, ControllerError> {
        self.record("create_token", &request.name)?;
        let mut data = self.data.lock().unwrap();
        let token = Token {
            id: Self::next_id(&mut data, "token-"),
            name: request.name.clone(),
            org_id: request.org.id.clone(),
            org_name: request.org.name.clone(),
            bucket: None,
            permission: request.action.to_string(),
            value: Some(format!("value-of-{}", request.name)),
        };
        data.tokens.push(token.clone());
        Ok(token)
    }

    async fn delete_token(&self, token: &Token) -> Result<(), ControllerError> {
        self.record("delete_token", &token.name)?;
        self.data
            .lock()
            .unwrap()
            .tokens
            .retain(|existing| existing.id != token.id);
        Ok(())
    }
}

/// In-memory Secret store holding only Secrets owned by the deployment
#[derive(Default)]
pub struct FakeSecretStore {
    secrets: Mutex<Vec<ObservedSecret>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ErrorFactory>>,
}

impl FakeSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, name: &str, namespace: &str, token_value: &str) -> Self {
        self.secrets.lock().unwrap().push(ObservedSecret {
            name: name.to_string(),
            namespace: namespace.to_string(),
            token_value: token_value.to_string(),
        });
        self
    }

    pub fn fail_on(
        self,
        operation: &str,
        error: impl Fn() -> ControllerError + Send + Sync + 'static,
    ) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), Box::new(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn secrets(&self) -> Vec<ObservedSecret> {
        self.secrets.lock().unwrap().clone()
    }

    /// `(namespace/name, value)` pairs, sorted
    pub fn contents(&self) -> Vec<(String, String)> {
        let mut contents: Vec<_> = self
            .secrets()
            .into_iter()
            .map(|secret| {
                (
                    format!("{}/{}", secret.namespace, secret.name),
                    secret.token_value,
                )
            })
            .collect();
        contents.sort();
        contents
    }

    fn record(&self, operation: &str, detail: &str) -> Result<(), ControllerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation}:{detail}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn list_secrets(&self) -> Result<Vec<ObservedSecret>, ControllerError> {
        self.record("list_secrets", "")?;
        Ok(self.secrets())
    }

    async fn create_secret(&self, secret: &NewSecret) -> Result<(), ControllerError> {
        self.record(
            "create_secret",
            &format!("{}/{}", secret.namespace, secret.name),
        )?;
        self.secrets.lock().unwrap().push(ObservedSecret {
            name: secret.name.clone(),
            namespace: secret.namespace.clone(),
            token_value: secret.token_value.clone(),
        });
        Ok(())
    }

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), ControllerError> {
        self.record("delete_secret", &format!("{namespace}/{name}"))?;
        self.secrets
            .lock()
            .unwrap()
            .retain(|secret| !(secret.name == name && secret.namespace == namespace));
        Ok(())
    }
}
