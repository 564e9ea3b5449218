//! # Request Types
//!
//! InfluxDB v2 REST API request payloads.
//!
//! API Reference: https://docs.influxdata.com/influxdb/v2/api/

use crate::constants::TOKEN_RESOURCE_TYPES;
use crate::model::Action;
use serde::Serialize;

/// Body of `POST /api/v2/orgs`
#[derive(Debug, Serialize)]
pub struct CreateOrgRequest {
    pub name: String,
}

/// Body of `POST /api/v2/buckets`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    #[serde(rename = "orgID")]
    pub org_id: String,
    pub name: String,
    /// Empty means infinite retention
    pub retention_rules: Vec<serde_json::Value>,
}

impl CreateBucketRequest {
    pub fn new(org_id: &str, name: &str) -> Self {
        Self {
            org_id: org_id.to_string(),
            name: name.to_string(),
            retention_rules: Vec::new(),
        }
    }
}

/// Body of `POST /api/v2/authorizations`
#[derive(Debug, Serialize)]
pub struct CreateAuthorizationRequest {
    pub status: &'static str,
    /// The token name; read back as the token's name when listing
    pub description: String,
    #[serde(rename = "orgID")]
    pub org_id: String,
    pub permissions: Vec<PermissionRequest>,
}

#[derive(Debug, Serialize)]
pub struct PermissionRequest {
    pub action: Action,
    pub resource: ResourceRequest,
}

#[derive(Debug, Serialize)]
pub struct ResourceRequest {
    #[serde(rename = "orgID")]
    pub org_id: String,
    #[serde(rename = "type")]
    pub resource_type: &'static str,
}

impl CreateAuthorizationRequest {
    /// Grant `action` on every token resource type across the whole org
    pub fn org_wide(name: &str, org_id: &str, action: Action) -> Self {
        let permissions = TOKEN_RESOURCE_TYPES
            .iter()
            .map(|&resource_type| PermissionRequest {
                action,
                resource: ResourceRequest {
                    org_id: org_id.to_string(),
                    resource_type,
                },
            })
            .collect();

        Self {
            status: "active",
            description: name.to_string(),
            org_id: org_id.to_string(),
            permissions,
        }
    }
}
