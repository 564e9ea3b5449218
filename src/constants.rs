//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Label marking a Secret as managed by this controller
pub const MANAGED_BY_LABEL: &str = "managed-by-isc";

/// Value of [`MANAGED_BY_LABEL`] on owned Secrets
pub const MANAGED_BY_VALUE: &str = "true";

/// Label carrying the deployment name that owns a Secret
pub const INSTANCE_LABEL: &str = "isc-name";

/// Key inside the Secret payload holding the InfluxDB token value
pub const TOKEN_DATA_KEY: &str = "token";

/// InfluxDB resource types a created token is granted on.
///
/// The requested action is applied org-wide across every entry, even when the
/// desired entry names a bucket. Existing consumers depend on this exact shape.
pub const TOKEN_RESOURCE_TYPES: [&str; 12] = [
    "buckets",
    "dashboards",
    "variables",
    "labels",
    "views",
    "documents",
    "checks",
    "dbrp",
    "notebooks",
    "annotations",
    "remotes",
    "replications",
];

/// Default path of the desired-state file
pub const DEFAULT_CONFIG_PATH: &str = "./config.yml";

/// Default deployment name used for the ownership label
pub const DEFAULT_DEPLOYMENT_NAME: &str = "isc";

/// Default InfluxDB base URI
pub const DEFAULT_INFLUXDB_URI: &str = "http://localhost:8086";

/// Default per-request timeout for InfluxDB calls (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default page size when listing Secrets
pub const DEFAULT_SECRET_LIST_PAGE_SIZE: u32 = 100;

/// Page size for InfluxDB org and bucket listings (server maximum)
pub const INFLUXDB_PAGE_SIZE: usize = 100;
