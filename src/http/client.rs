//! HTTP client for the test app ingress

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Got bad response from {url}: status code {status}")]
    BadStatus { url: String, status: u16 },
}

/// Anything that can fetch a URL and report the status code
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// GET `url`, succeeding only for status codes below 400
    async fn probe(&self, url: &str) -> Result<u16, HttpError>;
}

/// HTTP client for probing and load
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(30)
    }

    /// Create client with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::RequestFailed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// GET a URL and read the whole body
    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        debug!("Sending GET request to {}", url);
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                HttpError::ConnectionRefused(url.to_string())
            } else {
                HttpError::RequestFailed(e.to_string())
            }
        })?;

        let status_code = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::RequestFailed(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status_code,
            body_len: body.len(),
            duration: start.elapsed(),
        })
    }
}

#[async_trait]
impl HttpProbe for HttpClient {
    async fn probe(&self, url: &str) -> Result<u16, HttpError> {
        let response = self.get(url).await?;
        if response.status_code >= 400 {
            return Err(HttpError::BadStatus {
                url: url.to_string(),
                status: response.status_code,
            });
        }
        Ok(response.status_code)
    }
}

/// HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body_len: usize,
    pub duration: Duration,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_accepts_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/delay/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let status = client
            .probe(&format!("{}/delay/1", server.uri()))
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_probe_rejects_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client.probe(&server.uri()).await.unwrap_err();
        assert!(matches!(err, HttpError::BadStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_get_reports_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let response = HttpClient::new().unwrap().get(&server.uri()).await.unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(response.body_len, 7);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // a port that was just released has no listener
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpClient::with_timeout(2).unwrap();
        let err = client.probe(&url).await.unwrap_err();
        assert_eq!(err, HttpError::ConnectionRefused(url));
    }
}
