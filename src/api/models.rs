//! Request and response bodies of the cluster management API
//!
//! Response fields are optional or defaulted so that a response missing a
//! field still decodes and can be reported by the assertion layer instead of
//! failing the request. An explicit `null` is treated like a missing field.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /v4/info/`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub general: InfoGeneral,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoGeneral {
    #[serde(default, deserialize_with = "null_as_default")]
    pub installation_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datacenter: String,
}

/// `POST /v5/clusters/`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AddClusterRequest {
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub release_version: String,
}

/// Cluster details as returned by create and get
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_endpoint: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub create_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_version: String,
    pub master: Option<Master>,
    pub master_nodes: Option<MasterNodes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Master {
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability_zone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterNodes {
    pub availability_zones: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub high_availability: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_ready: i64,
}

/// `POST /v5/clusters/{id}/nodepools/`; empty means "use defaults"
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AddNodePoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
}

/// `PATCH /v5/clusters/{id}/nodepools/{np}/`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifyNodePoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
}

impl ModifyNodePoolRequest {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            scaling: None,
        }
    }

    pub fn scale(min: i64, max: i64) -> Self {
        Self {
            name: None,
            scaling: Some(Scaling { min, max }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    #[serde(default, deserialize_with = "null_as_default")]
    pub min: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max: i64,
}

/// Node pool details as returned by create, get and modify
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePool {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability_zones: Vec<String>,
    pub scaling: Option<Scaling>,
    pub node_spec: Option<NodeSpec>,
    pub status: Option<NodePoolStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub aws: Option<AwsNodeSpec>,
    pub volume_sizes_gb: Option<VolumeSizes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsNodeSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_type: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSizes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub docker: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kubelet: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolStatus {
    /// Desired number of nodes
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes_ready: i64,
}

/// `POST /v4/clusters/{id}/key-pairs/`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddKeyPairRequest {
    pub description: String,
    pub ttl_hours: i32,
    pub certificate_organizations: String,
    pub cn_prefix: String,
}

impl Default for AddKeyPairRequest {
    /// Short lived cluster-admin credentials
    fn default() -> Self {
        Self {
            description: "test key pair".to_string(),
            ttl_hours: 12,
            certificate_organizations: "system:masters".to_string(),
            cn_prefix: "user@giantswarm.io".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ttl_hours: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub create_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certificate_authority_data: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_certificate_data: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_key_data: String,
}

/// Error body of non-2xx responses
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}
