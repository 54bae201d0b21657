//! Self-contained kubeconfig files
//!
//! Serializes a single cluster / single user kubeconfig holding the key pair
//! material inline, so kubectl needs no other files.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CLUSTER_NAME: &str = "this-cluster";
const USER_NAME: &str = "this-user";
const CONTEXT_NAME: &str = "this-context";

#[derive(Error, Debug)]
pub enum KubeconfigError {
    #[error("failed to serialize kubeconfig: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write kubeconfig {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kubeconfig {
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub server: String,
    pub certificate_authority_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    pub client_certificate_data: String,
    pub client_key_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
}

/// Key pair material as returned by the API, not yet encoded
#[derive(Clone, Debug)]
pub struct Credentials<'a> {
    pub certificate_authority: &'a str,
    pub client_certificate: &'a str,
    pub client_key: &'a str,
}

impl Kubeconfig {
    /// Build a kubeconfig pointing at `api_endpoint` with the given credentials
    pub fn new(api_endpoint: &str, credentials: &Credentials<'_>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: CLUSTER_NAME.to_string(),
                cluster: Cluster {
                    server: api_endpoint.to_string(),
                    certificate_authority_data: STANDARD
                        .encode(credentials.certificate_authority),
                },
            }],
            users: vec![NamedUser {
                name: USER_NAME.to_string(),
                user: User {
                    client_certificate_data: STANDARD.encode(credentials.client_certificate),
                    client_key_data: STANDARD.encode(credentials.client_key),
                },
            }],
            contexts: vec![NamedContext {
                name: CONTEXT_NAME.to_string(),
                context: Context {
                    cluster: CLUSTER_NAME.to_string(),
                    user: USER_NAME.to_string(),
                },
            }],
            current_context: CONTEXT_NAME.to_string(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, KubeconfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
impl Kubeconfig {
    pub fn read(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Server URL of the single cluster entry
    pub fn server(&self) -> Option<&str> {
        self.clusters.first().map(|c| c.cluster.server.as_str())
    }

    /// Decoded CA, client certificate and client key of the single entries
    pub fn decoded_credentials(&self) -> anyhow::Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        let cluster = &self.clusters[0].cluster;
        let user = &self.users[0].user;
        Ok((
            STANDARD.decode(&cluster.certificate_authority_data)?,
            STANDARD.decode(&user.client_certificate_data)?,
            STANDARD.decode(&user.client_key_data)?,
        ))
    }
}

/// Write a self-contained kubeconfig file to `path`
///
/// The file holds a private key, so on unix it is created with mode 0600.
pub fn write_kubeconfig_file(
    path: impl AsRef<Path>,
    api_endpoint: &str,
    credentials: &Credentials<'_>,
) -> Result<(), KubeconfigError> {
    let path = path.as_ref();
    let yaml = Kubeconfig::new(api_endpoint, credentials).to_yaml()?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let write_err = |source| KubeconfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(yaml.as_bytes()).map_err(write_err)?;

    Ok(())
}

/// Keep only characters that are safe in a file name
///
/// Key pair ids are colon separated fingerprints, e.g. `a1:b2:c3`.
pub fn sanitize_file_component(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Deterministic kubeconfig file name for a cluster and key pair
pub fn kubeconfig_file_name(cluster_id: &str, key_pair_id: &str) -> String {
    format!(
        "kubeconfig_uat_{}_{}.yaml",
        sanitize_file_component(cluster_id),
        sanitize_file_component(key_pair_id)
    )
}
