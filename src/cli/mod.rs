//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::AuthScheme;
use crate::config::{
    ConfigError, EnvConfig, RunConfig, TeardownPolicy, Timings, DEFAULT_MANIFEST_TEMPLATE,
    DEFAULT_OWNER_ORG,
};

/// Acceptance test for the cluster management API
#[derive(Parser, Debug)]
#[command(name = "api-acceptance-test")]
#[command(version)]
#[command(about = "Create a cluster through the API, exercise it and tear it down")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the acceptance test
    Run(RunArgs),

    /// Show the environment variables that override flags
    Env,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// API endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Auth scheme, 'giantswarm' or 'Bearer' (case sensitive)
    #[arg(long)]
    pub scheme: Option<String>,

    /// Auth token
    #[arg(long)]
    pub token: Option<String>,

    /// Use this existing cluster instead of creating one
    #[arg(long)]
    pub cluster_id: Option<String>,

    /// Use this existing node pool instead of creating one
    #[arg(long = "first-nodepool-id")]
    pub first_nodepool_id: Option<String>,

    /// Organization owning the test cluster
    #[arg(long)]
    pub owner_org: Option<String>,

    /// Release version for the test cluster, latest if unset
    #[arg(long)]
    pub release_version: Option<String>,

    /// Print verbose diagnostics
    #[arg(long)]
    pub enable_logging: bool,

    /// Directory for the kubeconfig, rendered manifest and load log
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Test app manifest template
    #[arg(long, default_value = DEFAULT_MANIFEST_TEMPLATE)]
    pub manifest_template: PathBuf,

    /// Seconds to wait for the cluster to accept kubectl requests
    #[arg(long, default_value = "1800")]
    pub reachability_timeout: u64,

    /// Seconds to wait for the test app ingress
    #[arg(long, default_value = "1200")]
    pub ingress_timeout: u64,

    /// Leave the cluster in place after the run
    #[arg(long)]
    pub keep_cluster: bool,

    /// Delete the node pool before deleting the cluster
    #[arg(long = "delete-nodepool")]
    pub delete_nodepool: bool,

    /// Fail the run if resources cannot be deleted
    #[arg(long)]
    pub require_cleanup: bool,
}

impl RunArgs {
    /// Merge with environment overrides; flags win over environment, environment over defaults
    pub fn into_config(self, env: &EnvConfig) -> Result<RunConfig, ConfigError> {
        let endpoint = self
            .endpoint
            .or_else(|| env.endpoint.clone())
            .ok_or(ConfigError::Missing("endpoint"))?;
        let token = self
            .token
            .or_else(|| env.token.clone())
            .ok_or(ConfigError::Missing("token"))?;

        let scheme = self
            .scheme
            .unwrap_or_else(|| env.scheme_or(AuthScheme::GiantSwarm.as_str()));
        let scheme: AuthScheme = scheme.parse().map_err(|e: crate::api::ApiError| {
            ConfigError::Invalid {
                flag: "scheme",
                reason: e.to_string(),
            }
        })?;

        let timings = Timings {
            reachability_timeout: Duration::from_secs(self.reachability_timeout),
            ingress_timeout: Duration::from_secs(self.ingress_timeout),
            ..Timings::default()
        };

        let config = RunConfig {
            endpoint,
            scheme,
            token,
            cluster_id: self.cluster_id,
            first_node_pool_id: self.first_nodepool_id,
            owner_org: self
                .owner_org
                .unwrap_or_else(|| env.owner_org_or(DEFAULT_OWNER_ORG)),
            release_version: self.release_version.or_else(|| env.release_version.clone()),
            enable_logging: self.enable_logging || env.enable_logging_or(false),
            work_dir: self.work_dir,
            manifest_template: self.manifest_template,
            timings,
            teardown: TeardownPolicy {
                keep_cluster: self.keep_cluster,
                delete_node_pool: self.delete_nodepool,
                require_cleanup: self.require_cleanup,
            },
        };

        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["api-acceptance-test", "run"];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Command::Run(args) => args,
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let args = run_args(&["--endpoint", "https://api.example.com", "--token", "t"]);
        assert_eq!(args.work_dir, PathBuf::from("."));
        assert_eq!(args.reachability_timeout, 1800);
        assert_eq!(args.ingress_timeout, 1200);
        assert!(!args.keep_cluster);

        let config = args.into_config(&EnvConfig::default()).unwrap();
        assert_eq!(config.scheme, AuthScheme::GiantSwarm);
        assert_eq!(config.owner_org, "giantswarm");
        assert!(config.cluster_id.is_none());
        assert_eq!(
            config.manifest_template,
            PathBuf::from("./testapp-manifest.yaml.template")
        );
    }

    #[test]
    fn test_run_all_flags() {
        let args = run_args(&[
            "--endpoint",
            "https://api.example.com/",
            "--scheme",
            "Bearer",
            "--token",
            "t",
            "--cluster-id",
            "f9x2k",
            "--first-nodepool-id",
            "a7k",
            "--owner-org",
            "acme",
            "--release-version",
            "11.0.0",
            "--enable-logging",
            "--reachability-timeout",
            "60",
            "--keep-cluster",
            "--delete-nodepool",
            "--require-cleanup",
        ]);

        let config = args.into_config(&EnvConfig::default()).unwrap();
        assert_eq!(config.endpoint, "https://api.example.com");
        assert_eq!(config.scheme, AuthScheme::Bearer);
        assert_eq!(config.cluster_id.as_deref(), Some("f9x2k"));
        assert_eq!(config.first_node_pool_id.as_deref(), Some("a7k"));
        assert_eq!(config.owner_org, "acme");
        assert!(config.enable_logging);
        assert_eq!(config.timings.reachability_timeout, Duration::from_secs(60));
        assert!(config.teardown.keep_cluster);
        assert!(config.teardown.delete_node_pool);
        assert!(config.teardown.require_cleanup);
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        let args = run_args(&[
            "--endpoint",
            "https://api.example.com",
            "--token",
            "t",
            "--scheme",
            "bearer",
        ]);
        let err = args.into_config(&EnvConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { flag: "scheme", .. }));
    }

    #[test]
    fn test_environment_fills_gaps_flags_win() {
        let env = EnvConfig {
            endpoint: Some("https://api.from-env.example.com".to_string()),
            token: Some("env-token".to_string()),
            owner_org: Some("env-org".to_string()),
            ..Default::default()
        };

        let args = run_args(&["--owner-org", "flag-org"]);
        let config = args.into_config(&env).unwrap();
        assert_eq!(config.endpoint, "https://api.from-env.example.com");
        assert_eq!(config.token, "env-token");
        assert_eq!(config.owner_org, "flag-org");
    }

    #[test]
    fn test_missing_endpoint() {
        let args = run_args(&["--token", "t"]);
        let err = args.into_config(&EnvConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::Missing("endpoint"));
    }

    #[test]
    fn test_env_command() {
        let args = Args::parse_from(["api-acceptance-test", "env"]);
        assert!(matches!(args.command, Command::Env));
    }
}
