//! # Response Types
//!
//! InfluxDB v2 REST API response payloads and their conversion into the
//! domain model.

use crate::model::{Bucket, Org, Token};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct OrgResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OrgsResponse {
    #[serde(default)]
    pub orgs: Vec<OrgResponse>,
}

#[derive(Debug, Deserialize)]
pub struct BucketResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BucketsResponse {
    #[serde(default)]
    pub buckets: Vec<BucketResponse>,
}

#[derive(Deserialize)]
pub struct AuthorizationResponse {
    pub id: String,
    /// Only disclosed on creation by newer servers
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "orgID")]
    pub org_id: String,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionResponse>,
}

impl std::fmt::Debug for AuthorizationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResponse")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizationsResponse {
    #[serde(default)]
    pub authorizations: Vec<AuthorizationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionResponse {
    pub action: String,
    pub resource: ResourceResponse,
}

#[derive(Debug, Deserialize)]
pub struct ResourceResponse {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "orgID", default)]
    pub org_id: Option<String>,
}

/// InfluxDB error body, e.g. `{"code":"conflict","message":"organization with name o1 already exists"}`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<OrgResponse> for Org {
    fn from(org: OrgResponse) -> Self {
        Org {
            id: org.id,
            name: org.name,
        }
    }
}

impl BucketResponse {
    pub fn into_bucket(self, org: &Org) -> Bucket {
        Bucket {
            id: self.id,
            name: self.name,
            org_id: self.org_id.unwrap_or_else(|| org.id.clone()),
        }
    }
}

impl From<AuthorizationResponse> for Token {
    fn from(auth: AuthorizationResponse) -> Self {
        let bucket = auth
            .permissions
            .iter()
            .find(|p| p.resource.resource_type == "buckets")
            .and_then(|p| match (&p.resource.id, &p.resource.name) {
                (Some(id), Some(name)) => Some(Bucket {
                    id: id.clone(),
                    name: name.clone(),
                    org_id: p
                        .resource
                        .org_id
                        .clone()
                        .unwrap_or_else(|| auth.org_id.clone()),
                }),
                _ => None,
            });
        let permission = auth
            .permissions
            .first()
            .map(|p| p.action.clone())
            .unwrap_or_default();

        Token {
            id: auth.id,
            name: auth.description.unwrap_or_default(),
            org_id: auth.org_id,
            org_name: auth.org.unwrap_or_default(),
            bucket,
            permission,
            value: auth.token.filter(|t| !t.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_org_wide_authorization_has_no_bucket() {
        let auth: AuthorizationResponse = serde_json::from_value(json!({
            "id": "auth-1",
            "token": "tok-value",
            "status": "active",
            "description": "a-ns1",
            "orgID": "org-1",
            "org": "o1",
            "permissions": [
                {"action": "read", "resource": {"type": "buckets", "orgID": "org-1", "org": "o1"}},
                {"action": "read", "resource": {"type": "dashboards", "orgID": "org-1"}}
            ]
        }))
        .unwrap();

        let token = Token::from(auth);
        assert_eq!(token.name, "a-ns1");
        assert_eq!(token.org_id, "org-1");
        assert_eq!(token.org_name, "o1");
        assert_eq!(token.bucket, None);
        assert_eq!(token.permission, "read");
        assert_eq!(token.value.as_deref(), Some("tok-value"));
    }

    #[test]
    fn test_bucket_scoped_authorization_keeps_bucket_reference() {
        let auth: AuthorizationResponse = serde_json::from_value(json!({
            "id": "auth-2",
            "description": "b-ns2",
            "orgID": "org-1",
            "permissions": [
                {"action": "write", "resource": {"type": "buckets", "id": "bkt-1", "name": "b1", "orgID": "org-1"}}
            ]
        }))
        .unwrap();

        let token = Token::from(auth);
        assert_eq!(
            token.bucket,
            Some(Bucket {
                id: "bkt-1".to_string(),
                name: "b1".to_string(),
                org_id: "org-1".to_string(),
            })
        );
        assert_eq!(token.permission, "write");
        assert_eq!(token.value, None);
        assert_eq!(token.org_name, "");
    }

    #[test]
    fn test_empty_token_value_is_treated_as_unknown() {
        let auth: AuthorizationResponse = serde_json::from_value(json!({
            "id": "auth-3",
            "token": "",
            "orgID": "org-1",
            "permissions": []
        }))
        .unwrap();

        let token = Token::from(auth);
        assert_eq!(token.value, None);
        assert_eq!(token.name, "");
        assert_eq!(token.permission, "");
    }
}
