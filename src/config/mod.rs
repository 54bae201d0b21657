//! Run configuration
//!
//! Flags and `API_ACCEPTANCE_TEST_*` environment variables are merged into a
//! validated [`RunConfig`] before any network call is made.

mod env;

pub use env::{print_env_help, EnvConfig, ENV_PREFIX};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api::AuthScheme;

pub const DEFAULT_OWNER_ORG: &str = "giantswarm";
pub const DEFAULT_MANIFEST_TEMPLATE: &str = "./testapp-manifest.yaml.template";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required flag --{0}")]
    Missing(&'static str),

    #[error("invalid value for --{flag}: {reason}")]
    Invalid { flag: &'static str, reason: String },
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        "invalid_config"
    }
}

/// Waits, pauses and bounds used by the run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timings {
    pub reachability_interval: Duration,
    pub reachability_timeout: Duration,
    pub ingress_interval: Duration,
    pub ingress_timeout: Duration,
    /// Pause after node pool creation
    pub node_pool_settle: Duration,
    pub observation_interval: Duration,
    pub observation_rounds: u32,
    /// Pause before deleting anything
    pub teardown_delay: Duration,
    pub load_duration: Duration,
    pub load_report_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reachability_interval: Duration::from_secs(10),
            reachability_timeout: Duration::from_secs(30 * 60),
            ingress_interval: Duration::from_secs(10),
            ingress_timeout: Duration::from_secs(20 * 60),
            node_pool_settle: Duration::from_secs(1),
            observation_interval: Duration::from_secs(60),
            observation_rounds: 10,
            teardown_delay: Duration::from_secs(5),
            load_duration: Duration::from_secs(5 * 60 * 60),
            load_report_interval: Duration::from_secs(10),
        }
    }
}

/// What happens to created resources at the end of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownPolicy {
    pub keep_cluster: bool,
    pub delete_node_pool: bool,
    pub require_cleanup: bool,
}

/// Everything one acceptance run needs
#[derive(Clone)]
pub struct RunConfig {
    pub endpoint: String,
    pub scheme: AuthScheme,
    pub token: String,
    /// Reuse this cluster instead of creating one
    pub cluster_id: Option<String>,
    /// Reuse this node pool instead of creating one
    pub first_node_pool_id: Option<String>,
    pub owner_org: String,
    /// Release to create the cluster with, without the `v` prefix
    pub release_version: Option<String>,
    pub enable_logging: bool,
    pub work_dir: PathBuf,
    pub manifest_template: PathBuf,
    pub timings: Timings,
    pub teardown: TeardownPolicy,
}

impl RunConfig {
    /// Minimal configuration with defaults for everything optional
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            scheme: AuthScheme::GiantSwarm,
            token: token.into(),
            cluster_id: None,
            first_node_pool_id: None,
            owner_org: DEFAULT_OWNER_ORG.to_string(),
            release_version: None,
            enable_logging: false,
            work_dir: PathBuf::from("."),
            manifest_template: PathBuf::from(DEFAULT_MANIFEST_TEMPLATE),
            timings: Timings::default(),
            teardown: TeardownPolicy::default(),
        }
    }

    /// Check values that would otherwise fail half way through a run
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        if self.endpoint.is_empty() {
            return Err(ConfigError::Missing("endpoint"));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                flag: "endpoint",
                reason: format!("{:?} is not an http(s) URL", self.endpoint),
            });
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        if self.owner_org.trim().is_empty() {
            return Err(ConfigError::Invalid {
                flag: "owner-org",
                reason: "must not be empty".to_string(),
            });
        }

        self.cluster_id = self.cluster_id.filter(|id| !id.is_empty());
        self.first_node_pool_id = self.first_node_pool_id.filter(|id| !id.is_empty());
        if self.first_node_pool_id.is_some() && self.cluster_id.is_none() {
            return Err(ConfigError::Invalid {
                flag: "first-nodepool-id",
                reason: "requires --cluster-id".to_string(),
            });
        }

        self.release_version = self
            .release_version
            .map(|v| v.trim().trim_start_matches('v').to_string())
            .filter(|v| !v.is_empty());

        if self.timings.reachability_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                flag: "reachability-timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.timings.ingress_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                flag: "ingress-timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(self)
    }

    pub fn load_log_path(&self) -> PathBuf {
        self.work_dir.join("load.log")
    }

    pub fn rendered_manifest_path(&self) -> PathBuf {
        self.work_dir.join("testapp-manifest.yaml")
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("endpoint", &self.endpoint)
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .field("cluster_id", &self.cluster_id)
            .field("first_node_pool_id", &self.first_node_pool_id)
            .field("owner_org", &self.owner_org)
            .field("release_version", &self.release_version)
            .field("enable_logging", &self.enable_logging)
            .field("work_dir", &self.work_dir)
            .field("manifest_template", &self.manifest_template)
            .field("timings", &self.timings)
            .field("teardown", &self.teardown)
            .finish()
    }
}
