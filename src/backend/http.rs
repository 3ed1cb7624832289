//! reqwest-based backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::{BackendError, BackendResponse, StatsBackend};

/// HTTP backend talking to the stats API at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend for the given base URL.
    ///
    /// Fails if the TLS backend or system configuration cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repostats/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a backend around a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL and an endpoint path with exactly one slash
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl StatsBackend for HttpBackend {
    fn backend_type(&self) -> &str {
        "http"
    }

    async fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError> {
        let url = self.endpoint_url(endpoint);
        debug!("POST {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(e.to_string())
                } else if e.is_connect() || e.is_request() {
                    BackendError::Network(e.to_string())
                } else if e.is_builder() {
                    BackendError::InvalidRequest(e.to_string())
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(format!("reading response body: {}", e))
            } else {
                BackendError::Network(format!("reading response body: {}", e))
            }
        })?;

        debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(BackendResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_with_single_slash() {
        let backend = HttpBackend::new("http://localhost:8000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.endpoint_url("/api/commits"), "http://localhost:8000/api/commits");
        assert_eq!(backend.endpoint_url("api/commits"), "http://localhost:8000/api/commits");
    }

    #[test]
    fn with_client_keeps_the_given_client() {
        let backend = HttpBackend::with_client(reqwest::Client::new(), "http://backend:8000//");
        assert_eq!(backend.base_url(), "http://backend:8000");
        assert_eq!(backend.backend_type(), "http");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transient_failure() {
        // Port 9 (discard) on localhost is closed in test environments
        let backend = HttpBackend::new("http://127.0.0.1:9").unwrap();
        let err = backend
            .post_json("/api/commits", &serde_json::json!({}), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {:?}", err);
    }
}
