//! # Directory Operations
//!
//! Implementation of [`DirectoryClient`] for the InfluxDB v2 REST API.

use super::requests::{CreateAuthorizationRequest, CreateBucketRequest, CreateOrgRequest};
use super::responses::{
    AuthorizationResponse, AuthorizationsResponse, BucketResponse, BucketsResponse, OrgResponse,
    OrgsResponse,
};
use super::InfluxClient;
use crate::constants::INFLUXDB_PAGE_SIZE;
use crate::error::ControllerError;
use crate::model::{Bucket, Org, Token};
use crate::provider::{DirectoryClient, TokenRequest};
use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

#[async_trait]
impl DirectoryClient for InfluxClient {
    async fn list_orgs(&self) -> Result<Vec<Org>, ControllerError> {
        let mut orgs = Vec::new();
        let mut offset = 0;

        // Org listings are paged; a short page is the last one
        loop {
            let page: OrgsResponse = self
                .send_json(
                    "list_orgs",
                    "list orgs",
                    self.request(Method::GET, "/api/v2/orgs").query(&[
                        ("limit", INFLUXDB_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ]),
                )
                .await?;
            let count = page.orgs.len();
            orgs.extend(page.orgs.into_iter().map(Org::from));
            if count < INFLUXDB_PAGE_SIZE {
                break;
            }
            offset += count;
        }

        Ok(orgs)
    }

    async fn create_org(&self, name: &str) -> Result<Org, ControllerError> {
        info!("Creating InfluxDB org {}", name);
        let org: OrgResponse = self
            .send_json(
                "create_org",
                &format!("create org {name}"),
                self.request(Method::POST, "/api/v2/orgs")
                    .json(&CreateOrgRequest {
                        name: name.to_string(),
                    }),
            )
            .await?;
        info!("Created InfluxDB org {} ({})", org.name, org.id);
        Ok(org.into())
    }

    async fn list_buckets(&self, org: &Org) -> Result<Vec<Bucket>, ControllerError> {
        let mut buckets = Vec::new();
        let mut offset = 0;
        let operation = format!("list buckets of org {}", org.name);

        loop {
            let page: BucketsResponse = self
                .send_json(
                    "list_buckets",
                    &operation,
                    self.request(Method::GET, "/api/v2/buckets").query(&[
                        ("orgID", org.id.clone()),
                        ("limit", INFLUXDB_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ]),
                )
                .await?;
            let count = page.buckets.len();
            buckets.extend(page.buckets.into_iter().map(|b| b.into_bucket(org)));
            if count < INFLUXDB_PAGE_SIZE {
                break;
            }
            offset += count;
        }

        Ok(buckets)
    }

    async fn create_bucket(&self, org: &Org, name: &str) -> Result<Bucket, ControllerError> {
        info!("Creating InfluxDB bucket {} in org {}", name, org.name);
        let bucket: BucketResponse = self
            .send_json(
                "create_bucket",
                &format!("create bucket {name} in org {}", org.name),
                self.request(Method::POST, "/api/v2/buckets")
                    .json(&CreateBucketRequest::new(&org.id, name)),
            )
            .await?;
        info!("Created InfluxDB bucket {} ({})", bucket.name, bucket.id);
        Ok(bucket.into_bucket(org))
    }

    async fn list_tokens(&self) -> Result<Vec<Token>, ControllerError> {
        let page: AuthorizationsResponse = self
            .send_json(
                "list_tokens",
                "list tokens",
                self.request(Method::GET, "/api/v2/authorizations"),
            )
            .await?;
        Ok(page.authorizations.into_iter().map(Token::from).collect())
    }

    async fn create_token(&self, request: &TokenRequest) -> Result<Token, ControllerError> {
        info!(
            "Creating InfluxDB token {} in org {} with {}",
            request.name, request.org.name, request.action
        );
        let operation = format!("create token {}", request.name);
        let auth: AuthorizationResponse = self
            .send_json(
                "create_token",
                &operation,
                self.request(Method::POST, "/api/v2/authorizations").json(
                    &CreateAuthorizationRequest::org_wide(
                        &request.name,
                        &request.org.id,
                        request.action,
                    ),
                ),
            )
            .await?;

        // Org-wide grants carry no bucket id, so `bucket` stays `None`,
        // matching what a later listing reports
        let mut token = Token::from(auth);
        if token.value.is_none() {
            return Err(ControllerError::directory(
                operation,
                format!("token {} was created but no value was returned", token.id),
            ));
        }
        token.name.clone_from(&request.name);
        token.org_name.clone_from(&request.org.name);
        info!("Created InfluxDB token {} ({})", token.name, token.id);
        Ok(token)
    }

    async fn delete_token(&self, token: &Token) -> Result<(), ControllerError> {
        info!("Deleting InfluxDB token {} ({})", token.name, token.id);
        self.send(
            "delete_token",
            &format!("delete token {}", token.name),
            self.request(
                Method::DELETE,
                &format!("/api/v2/authorizations/{}", token.id),
            ),
        )
        .await?;
        Ok(())
    }
}
