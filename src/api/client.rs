//! HTTP adapter for the cluster management API

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use super::models::{
    AddClusterRequest, AddKeyPairRequest, AddNodePoolRequest, ClusterDetails, ErrorBody,
    InfoResponse, KeyPair, ModifyNodePoolRequest, NodePool,
};
use super::{auth_header, ApiError, AuthScheme, ClusterApi};

/// Per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Authenticated client for the cluster management API
#[derive(Clone)]
pub struct GiantSwarmClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl std::fmt::Debug for GiantSwarmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiantSwarmClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GiantSwarmClient {
    /// Create a client for `endpoint`, authenticating every request
    pub fn new(endpoint: &str, scheme: AuthScheme, token: &str) -> Result<Self, ApiError> {
        Self::with_timeout(endpoint, scheme, token, DEFAULT_TIMEOUT_SECS)
    }

    /// Create client with custom timeout
    pub fn with_timeout(
        endpoint: &str,
        scheme: AuthScheme,
        token: &str,
        timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let url = Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid endpoint URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfig(format!(
                "endpoint URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            auth_header: auth_header(scheme, token)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and check the status, returning the successful response
    async fn send<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{}: {} {}", operation, method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, &self.auth_header);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    operation: operation.to_string(),
                }
            } else if e.is_connect() {
                ApiError::RequestFailed {
                    operation: operation.to_string(),
                    message: format!("connection refused to {url}"),
                }
            } else {
                ApiError::RequestFailed {
                    operation: operation.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        debug!("{}: response status {}", operation, status.as_u16());

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ApiError::ServiceUnavailable {
                operation: operation.to_string(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_else(|_| ErrorBody {
            code: String::new(),
            message: text.trim().to_string(),
        });

        Err(ApiError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            code: body.code,
            message: body.message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await.map_err(|e| ApiError::RequestFailed {
            operation: operation.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ClusterApi for GiantSwarmClient {
    async fn get_info(&self) -> Result<InfoResponse, ApiError> {
        let op = "get info";
        let response = self.send::<()>(op, Method::GET, "/v4/info/", None).await?;
        Self::decode(op, response).await
    }

    async fn create_cluster(
        &self,
        request: &AddClusterRequest,
    ) -> Result<ClusterDetails, ApiError> {
        let op = "create cluster";
        let response = self
            .send(op, Method::POST, "/v5/clusters/", Some(request))
            .await?;
        Self::decode(op, response).await
    }

    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetails, ApiError> {
        let op = "get cluster";
        let path = format!("/v5/clusters/{cluster_id}/");
        let response = self.send::<()>(op, Method::GET, &path, None).await?;
        Self::decode(op, response).await
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), ApiError> {
        let path = format!("/v4/clusters/{cluster_id}/");
        self.send::<()>("delete cluster", Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    async fn create_node_pool(
        &self,
        cluster_id: &str,
        request: &AddNodePoolRequest,
    ) -> Result<NodePool, ApiError> {
        let op = "create node pool";
        let path = format!("/v5/clusters/{cluster_id}/nodepools/");
        let response = self.send(op, Method::POST, &path, Some(request)).await?;
        Self::decode(op, response).await
    }

    async fn get_node_pool(
        &self,
        cluster_id: &str,
        node_pool_id: &str,
    ) -> Result<NodePool, ApiError> {
        let op = "get node pool";
        let path = format!("/v5/clusters/{cluster_id}/nodepools/{node_pool_id}/");
        let response = self.send::<()>(op, Method::GET, &path, None).await?;
        Self::decode(op, response).await
    }

    async fn modify_node_pool(
        &self,
        cluster_id: &str,
        node_pool_id: &str,
        request: &ModifyNodePoolRequest,
    ) -> Result<NodePool, ApiError> {
        let op = "modify node pool";
        let path = format!("/v5/clusters/{cluster_id}/nodepools/{node_pool_id}/");
        let response = self.send(op, Method::PATCH, &path, Some(request)).await?;
        Self::decode(op, response).await
    }

    async fn delete_node_pool(
        &self,
        cluster_id: &str,
        node_pool_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/v5/clusters/{cluster_id}/nodepools/{node_pool_id}/");
        self.send::<()>("delete node pool", Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    async fn create_key_pair(
        &self,
        cluster_id: &str,
        request: &AddKeyPairRequest,
    ) -> Result<KeyPair, ApiError> {
        let op = "create key pair";
        let path = format!("/v4/clusters/{cluster_id}/key-pairs/");
        let response = self.send(op, Method::POST, &path, Some(request)).await?;
        Self::decode(op, response).await
    }
}
