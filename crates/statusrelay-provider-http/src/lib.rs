// # HTTP Status Provider
//
// This crate provides an HTTP-based StatusProvider for the status relay.
//
// ## Purpose
//
// Fetches the monitored service's JSON status document with a single GET:
//
// ```json
// {
//   "is_maintenance": false,
//   "updated_at": "2025-01-09T12:00:00Z",
//   "last_maintenance": { "duration_minutes": 42.5, "started_at": "2025-01-09T11:00:00Z" }
// }
// ```
//
// ## Failure Model
//
// Anything but `200 OK` with a decodable body is a fetch failure. The
// provider never retries; the monitor simply tries again next cycle.

use statusrelay_core::config::StatusSourceConfig;
use statusrelay_core::traits::{StatusDocument, StatusProvider};
use statusrelay_core::{Error, Result};

use std::time::Duration;

/// Default timeout for one status fetch
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP-based status provider
#[derive(Debug, Clone)]
pub struct HttpStatusProvider {
    /// URL returning the status document
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpStatusProvider {
    /// Create a provider with the default 10 second timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a provider from the status source configuration
    pub fn from_config(config: &StatusSourceConfig) -> Result<Self> {
        config.validate()?;
        Self::with_timeout(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// URL being polled
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl StatusProvider for HttpStatusProvider {
    async fn fetch(&self) -> Result<StatusDocument> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::status_provider(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        let document = StatusDocument::from_json(&body).map_err(|e| {
            Error::status_provider(format!("Invalid status document: {}", e))
        })?;

        tracing::trace!(
            "Fetched status from {}: maintenance={}",
            self.url,
            document.is_maintenance()
        );
        Ok(document)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    /// Serve exactly one canned HTTP response, return the URL to hit
    async fn canned_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/maintenance-status", addr)
    }

    #[tokio::test]
    async fn test_fetch_active_document() {
        let url = canned_server(
            "200 OK",
            r#"{"is_maintenance": false, "updated_at": "2025-01-09T12:00:00Z"}"#,
        )
        .await;
        let provider = HttpStatusProvider::new(url).unwrap();

        let document = assert_ok!(provider.fetch().await);
        assert!(!document.is_maintenance());
        assert_eq!(document.updated_at(), Some("2025-01-09T12:00:00Z"));
    }

    #[tokio::test]
    async fn test_fetch_maintenance_with_last_window() {
        let url = canned_server(
            "200 OK",
            r#"{"is_maintenance": true, "last_maintenance": {"duration_minutes": 42.5, "started_at": "2025-01-09T11:00:00Z"}}"#,
        )
        .await;
        let provider = HttpStatusProvider::new(url).unwrap();

        let document = assert_ok!(provider.fetch().await);
        assert!(document.is_maintenance());
        let last = document.last_maintenance().unwrap();
        assert_eq!(last.duration_minutes(), 42.5);
    }

    #[tokio::test]
    async fn test_non_200_is_failure() {
        let url = canned_server("503 Service Unavailable", r#"{"is_maintenance": false}"#).await;
        let provider = HttpStatusProvider::new(url).unwrap();

        let err = assert_err!(provider.fetch().await);
        assert!(matches!(err, Error::StatusProvider(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_other_2xx_is_failure() {
        let url = canned_server("204 No Content", "").await;
        let provider = HttpStatusProvider::new(url).unwrap();

        assert_err!(provider.fetch().await);
    }

    #[tokio::test]
    async fn test_malformed_body_is_failure() {
        let url = canned_server("200 OK", "<html>maintenance</html>").await;
        let provider = HttpStatusProvider::new(url).unwrap();

        let err = assert_err!(provider.fetch().await);
        assert!(err.to_string().contains("Invalid status document"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = HttpStatusProvider::new(format!("http://{}/", addr)).unwrap();
        let err = assert_err!(provider.fetch().await);
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = StatusSourceConfig::default();
        let provider = HttpStatusProvider::from_config(&config).unwrap();
        assert_eq!(provider.url(), statusrelay_core::config::DEFAULT_STATUS_URL);
        assert_eq!(provider.provider_name(), "http");

        config.url = "ftp://example.com/status".to_string();
        assert!(HttpStatusProvider::from_config(&config).is_err());
    }
}
