//! Cluster management API
//!
//! [`ClusterApi`] is the capability set the acceptance run needs from the
//! API. [`GiantSwarmClient`] implements it over HTTP; tests substitute fakes.

mod auth;
mod client;
pub mod models;

pub use auth::{auth_header, AuthScheme};
pub use client::GiantSwarmClient;

use async_trait::async_trait;
use thiserror::Error;

use models::{
    AddClusterRequest, AddKeyPairRequest, AddNodePoolRequest, ClusterDetails, InfoResponse,
    KeyPair, ModifyNodePoolRequest, NodePool,
};

/// API client errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The API answered 503; the requested resource cannot be served yet
    #[error("{operation}: service temporarily unavailable")]
    ServiceUnavailable { operation: String },

    #[error("{operation}: status {status}: {message}")]
    Status {
        operation: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("{operation}: request failed: {message}")]
    RequestFailed { operation: String, message: String },

    #[error("{operation}: timeout")]
    Timeout { operation: String },

    #[error("{operation}: could not decode response: {message}")]
    Decode { operation: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::ServiceUnavailable { .. } => Some(503),
            _ => None,
        }
    }

    /// Whether the API rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Operations on clusters, node pools and key pairs
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn get_info(&self) -> Result<InfoResponse, ApiError>;

    async fn create_cluster(&self, request: &AddClusterRequest)
        -> Result<ClusterDetails, ApiError>;

    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetails, ApiError>;

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), ApiError>;

    async fn create_node_pool(
        &self,
        cluster_id: &str,
        request: &AddNodePoolRequest,
    ) -> Result<NodePool, ApiError>;

    async fn get_node_pool(&self, cluster_id: &str, node_pool_id: &str)
        -> Result<NodePool, ApiError>;

    async fn modify_node_pool(
        &self,
        cluster_id: &str,
        node_pool_id: &str,
        request: &ModifyNodePoolRequest,
    ) -> Result<NodePool, ApiError>;

    async fn delete_node_pool(&self, cluster_id: &str, node_pool_id: &str)
        -> Result<(), ApiError>;

    async fn create_key_pair(
        &self,
        cluster_id: &str,
        request: &AddKeyPairRequest,
    ) -> Result<KeyPair, ApiError>;
}
