//! # Kubernetes Secret Store
//!
//! Stores issued tokens as labeled `Opaque` Secrets.
//!
//! Every Secret created here carries `managed-by-isc=true` and
//! `isc-name=<deployment>`. Listing filters on the first label across all
//! namespaces, follows the API server's continue tokens, and keeps only the
//! Secrets whose `isc-name` matches this deployment.

use crate::constants::{INSTANCE_LABEL, MANAGED_BY_LABEL, MANAGED_BY_VALUE, TOKEN_DATA_KEY};
use crate::error::ControllerError;
use crate::model::ObservedSecret;
use crate::provider::{NewSecret, SecretStore};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Secret store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    deployment_name: String,
    page_size: u32,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore")
            .field("deployment_name", &self.deployment_name)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    pub fn new(client: Client, deployment_name: &str, page_size: u32) -> Self {
        Self {
            client,
            deployment_name: deployment_name.to_string(),
            page_size: page_size.max(1),
        }
    }
}

/// Label selector used to list candidate Secrets
#[must_use]
pub fn managed_selector() -> String {
    format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}")
}

/// Ownership labels written on every created Secret
#[must_use]
pub fn ownership_labels(deployment_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (INSTANCE_LABEL.to_string(), deployment_name.to_string()),
    ])
}

/// Build the Secret object for a newly issued token
#[must_use]
pub fn build_secret(secret: &NewSecret, deployment_name: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(secret.name.clone()),
            namespace: Some(secret.namespace.clone()),
            labels: Some(ownership_labels(deployment_name)),
            ..ObjectMeta::default()
        },
        type_: Some("Opaque".to_string()),
        string_data: Some(BTreeMap::from([(
            TOKEN_DATA_KEY.to_string(),
            secret.token_value.clone(),
        )])),
        ..Secret::default()
    }
}

/// Convert a listed Secret, or `None` if it belongs to another deployment
#[must_use]
pub fn observe_secret(secret: &Secret, deployment_name: &str) -> Option<ObservedSecret> {
    let name = secret.metadata.name.clone()?;
    let namespace = secret.metadata.namespace.clone()?;

    let owner = secret
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(INSTANCE_LABEL));
    if owner.map(String::as_str) != Some(deployment_name) {
        warn!(
            "Found secret {}/{} owned by '{}', not by this deployment '{}'; ignoring it",
            namespace,
            name,
            owner.map_or("<none>", String::as_str),
            deployment_name
        );
        return None;
    }

    // Secret data is base64 on the wire; ByteString holds the decoded bytes
    let token_value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(TOKEN_DATA_KEY))
        .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
        .unwrap_or_default();

    Some(ObservedSecret {
        name,
        namespace,
        token_value,
    })
}

fn map_kube_error(operation: &str, err: kube::Error) -> ControllerError {
    match err {
        kube::Error::Api(status) if status.code == 401 => ControllerError::unauthorized(operation),
        other => ControllerError::secret_store(operation, other.to_string()),
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn list_secrets(&self) -> Result<Vec<ObservedSecret>, ControllerError> {
        let api: Api<Secret> = Api::all(self.client.clone());
        let selector = managed_selector();
        let mut observed = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = ListParams::default()
                .labels(&selector)
                .limit(self.page_size);
            if let Some(token) = &continue_token {
                params = params.continue_token(token);
            }

            let page = api
                .list(&params)
                .await
                .map_err(|e| map_kube_error("list secrets", e))?;
            debug!("Listed {} managed secrets in page", page.items.len());

            observed.extend(
                page.items
                    .iter()
                    .filter_map(|secret| observe_secret(secret, &self.deployment_name)),
            );

            continue_token = page.metadata.continue_.filter(|t| !t.is_empty());
            if continue_token.is_none() {
                break;
            }
        }

        info!("Found {} secrets owned by {}", observed.len(), self.deployment_name);
        Ok(observed)
    }

    async fn create_secret(&self, secret: &NewSecret) -> Result<(), ControllerError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &secret.namespace);
        let object = build_secret(secret, &self.deployment_name);

        api.create(&PostParams::default(), &object)
            .await
            .map_err(|e| {
                map_kube_error(
                    &format!("create secret {}/{}", secret.namespace, secret.name),
                    e,
                )
            })?;
        info!("Created secret {}/{}", secret.namespace, secret.name);
        Ok(())
    }

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), ControllerError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        api.delete(name, &DeleteParams::default())
            .await
            .map_err(|e| map_kube_error(&format!("delete secret {namespace}/{name}"), e))?;
        info!("Deleted secret {}/{}", namespace, name);
        Ok(())
    }
}
