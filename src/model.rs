//! # Domain Model
//!
//! Organizations, buckets and tokens as known in InfluxDB, and the Secrets
//! previously issued by this controller.
//!
//! InfluxDB owns orgs, buckets and tokens; the controller only holds
//! references to them for matching and creation decisions and never deletes
//! orgs or buckets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// InfluxDB permission action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Org {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    /// Owning org (reference only)
    pub org_id: String,
}

/// An InfluxDB authorization
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub id: String,
    /// Read back from the authorization description
    pub name: String,
    pub org_id: String,
    pub org_name: String,
    /// `None` when the authorization carries no bucket-scoped permission
    pub bucket: Option<Bucket>,
    /// Action of the first permission grant
    pub permission: String,
    /// Only known right after creation, or when the listing disclosed it
    pub value: Option<String>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("org_id", &self.org_id)
            .field("org_name", &self.org_name)
            .field("bucket", &self.bucket)
            .field("permission", &self.permission)
            .field("value", &self.value.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A Secret previously created by this deployment
#[derive(Clone, PartialEq, Eq)]
pub struct ObservedSecret {
    pub name: String,
    pub namespace: String,
    /// Decoded token value; empty if the Secret carries none
    pub token_value: String,
}

impl fmt::Debug for ObservedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedSecret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("token_value", &"***")
            .finish()
    }
}

/// Deterministic InfluxDB token name for a Secret `name` in `namespace`
#[must_use]
pub fn token_name(name: &str, namespace: &str) -> String {
    format!("{name}-{namespace}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_name_is_name_dash_namespace() {
        assert_eq!(token_name("a", "ns1"), "a-ns1");
        assert_eq!(token_name("grafana", "monitoring"), "grafana-monitoring");
    }

    #[test]
    fn test_action_serde_uses_influxdb_vocabulary() {
        let action: Action = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(action, Action::Write);
        assert_eq!(serde_json::to_string(&Action::Read).unwrap(), "\"read\"");
        assert!(serde_json::from_str::<Action>("\"admin\"").is_err());
    }

    #[test]
    fn test_debug_redacts_token_values() {
        let token = Token {
            id: "t1".to_string(),
            name: "a-ns1".to_string(),
            org_id: "o1".to_string(),
            org_name: "org".to_string(),
            bucket: None,
            permission: "read".to_string(),
            value: Some("super-secret".to_string()),
        };
        let secret = ObservedSecret {
            name: "a".to_string(),
            namespace: "ns1".to_string(),
            token_value: "super-secret".to_string(),
        };
        assert!(!format!("{token:?}").contains("super-secret"));
        assert!(!format!("{secret:?}").contains("super-secret"));
    }
}
