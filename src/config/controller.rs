//! # Controller Configuration
//!
//! Process-level settings loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
/// In a cluster these are usually populated from a ConfigMap and a Secret
/// using `envFrom` on the CronJob.
#[derive(Clone)]
pub struct ControllerConfig {
    /// Desired-state file (`CONFIG_PATH`)
    pub config_path: PathBuf,
    /// Verbose logging (`DEBUG`)
    pub debug: bool,
    /// Ownership label value for Secrets (`DEPLOYMENT_NAME`)
    pub deployment_name: String,
    /// InfluxDB API token (`INFLUXDB_TOKEN`)
    pub influxdb_token: String,
    /// InfluxDB base URI (`INFLUXDB_URI`)
    pub influxdb_uri: String,
    /// Per-request timeout for InfluxDB calls (`HTTP_TIMEOUT_SECS`)
    pub http_timeout_secs: u64,
    /// Page size for the Secret listing (`SECRET_LIST_PAGE_SIZE`)
    pub secret_list_page_size: u32,
    /// Where to write Prometheus text exposition after a run (`METRICS_TEXTFILE`)
    pub metrics_textfile: Option<PathBuf>,
    /// Also revoke the InfluxDB token of a deleted stale Secret (`REVOKE_STALE_TOKENS`)
    pub revoke_stale_tokens: bool,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("config_path", &self.config_path)
            .field("debug", &self.debug)
            .field("deployment_name", &self.deployment_name)
            .field("influxdb_token", &"***")
            .field("influxdb_uri", &self.influxdb_uri)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("secret_list_page_size", &self.secret_list_page_size)
            .field("metrics_textfile", &self.metrics_textfile)
            .field("revoke_stale_tokens", &self.revoke_stale_tokens)
            .finish()
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            debug: false,
            deployment_name: DEFAULT_DEPLOYMENT_NAME.to_string(),
            influxdb_token: String::new(),
            influxdb_uri: DEFAULT_INFLUXDB_URI.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            secret_list_page_size: DEFAULT_SECRET_LIST_PAGE_SIZE,
            metrics_textfile: None,
            revoke_stale_tokens: false,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Lets tests supply variables without mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        use crate::constants::*;
        Self {
            config_path: PathBuf::from(var_or_default_str(&lookup, "CONFIG_PATH", DEFAULT_CONFIG_PATH)),
            debug: var_or_default_bool(&lookup, "DEBUG", false),
            deployment_name: var_or_default_str(&lookup, "DEPLOYMENT_NAME", DEFAULT_DEPLOYMENT_NAME),
            influxdb_token: var_or_default_str(&lookup, "INFLUXDB_TOKEN", ""),
            influxdb_uri: var_or_default_str(&lookup, "INFLUXDB_URI", DEFAULT_INFLUXDB_URI),
            http_timeout_secs: var_or_default_nonzero(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            secret_list_page_size: var_or_default_nonzero(
                &lookup,
                "SECRET_LIST_PAGE_SIZE",
                DEFAULT_SECRET_LIST_PAGE_SIZE,
            ),
            metrics_textfile: lookup("METRICS_TEXTFILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            revoke_stale_tokens: var_or_default_bool(&lookup, "REVOKE_STALE_TOKENS", false),
        }
    }

    /// Get the InfluxDB request timeout
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Read a variable and parse it, or return the default value
///
/// Zero counts as unset: neither a timeout nor a page size can be zero.
fn var_or_default_nonzero<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v != T::default())
        .unwrap_or(default)
}

/// Read a variable as boolean or return the default
fn var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.trim().to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read a variable as string or return the default
fn var_or_default_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}
