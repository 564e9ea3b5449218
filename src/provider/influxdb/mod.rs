//! # InfluxDB Directory Client
//!
//! Native REST implementation against the InfluxDB v2 API using reqwest.
//!
//! Every call maps a `401` to [`ControllerError::Unauthorized`] instead of
//! treating it as an empty result; any other non-success status becomes
//! [`ControllerError::Directory`] carrying the server's message.
//!
//! References:
//! - [InfluxDB v2 API](https://docs.influxdata.com/influxdb/v2/api/)

mod operations;
pub mod requests;
pub mod responses;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::observability::metrics;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

use responses::ErrorResponse;

/// InfluxDB v2 REST client
#[derive(Clone)]
pub struct InfluxClient {
    http_client: Client,
    base_url: String,
    api_token: String,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"***")
            .finish_non_exhaustive()
    }
}

impl InfluxClient {
    /// Create a client for `base_url` authenticating with `api_token`
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, ControllerError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ControllerError::directory("build HTTP client", e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        })
    }

    pub fn from_config(config: &ControllerConfig) -> Result<Self, ControllerError> {
        Self::new(
            &config.influxdb_uri,
            &config.influxdb_token,
            config.http_timeout(),
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::AUTHORIZATION, format!("Token {}", self.api_token))
            .header(header::ACCEPT, "application/json")
    }

    /// Send a request and decode a JSON response body
    async fn send_json<T: DeserializeOwned>(
        &self,
        metric: &'static str,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, ControllerError> {
        let response = self.send(metric, operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ControllerError::directory(operation, format!("invalid response body: {e}")))
    }

    /// Send a request, record metrics and turn failure statuses into errors
    ///
    /// `metric` is the low-cardinality operation label, `operation` the
    /// human-readable description used in errors.
    async fn send(
        &self,
        metric: &'static str,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ControllerError> {
        let start = Instant::now();
        let result = request.send().await;
        metrics::record_directory_operation(metric, start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            metrics::increment_directory_operation_errors(metric);
            ControllerError::directory(operation, e.to_string())
        })?;

        let status = response.status();
        debug!("InfluxDB {} -> {}", operation, status);
        if status.is_success() {
            return Ok(response);
        }

        metrics::increment_directory_operation_errors(metric);
        let error_text = response.text().await.unwrap_or_default();
        Err(handle_error_response(operation, status, &error_text))
    }
}

/// Classify a failed InfluxDB response
fn handle_error_response(operation: &str, status: StatusCode, error_text: &str) -> ControllerError {
    if status == StatusCode::UNAUTHORIZED {
        return ControllerError::unauthorized(operation);
    }

    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(error_text) {
        ControllerError::directory(
            operation,
            format!(
                "HTTP {} ({}): {}",
                status.as_u16(),
                error_response.code,
                error_response.message
            ),
        )
    } else {
        ControllerError::directory(operation, format!("HTTP {}: {}", status.as_u16(), error_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_is_unauthorized_not_a_directory_error() {
        let err = handle_error_response("list orgs", StatusCode::UNAUTHORIZED, "");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_influx_error_body_is_surfaced() {
        let err = handle_error_response(
            "create org o1",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":"conflict","message":"organization with name o1 already exists"}"#,
        );
        assert_eq!(
            err.to_string(),
            "InfluxDB failed to create org o1: HTTP 422 (conflict): organization with name o1 already exists"
        );
    }

    #[test]
    fn test_plain_error_body_is_kept_verbatim() {
        let err = handle_error_response("list tokens", StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(
            err.to_string(),
            "InfluxDB failed to list tokens: HTTP 502: upstream down"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed_from_base_url() {
        let client =
            InfluxClient::new("http://influx:8086/", "admin-token", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://influx:8086");
        assert!(!format!("{client:?}").contains("admin-token"));
    }
}
