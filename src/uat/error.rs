//! Run failures
//!
//! Every fatal error carries a stable kind string and, where there is
//! something the operator can do about it, a short hint.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::api::ApiError;
use crate::assertions::AssertionError;
use crate::config::ConfigError;
use crate::kubeconfig::KubeconfigError;
use crate::shell::ShellError;

/// The fixed steps of an acceptance run, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Authenticate,
    CreateCluster,
    ResolveEndpoint,
    CreateNodePool,
    IssueCredentials,
    ProbeReachability,
    DeployWorkload,
    GenerateLoad,
    ObserveScaling,
    MutateNodePool,
    Teardown,
}

impl Step {
    #[cfg(test)]
    pub const ALL: [Step; 11] = [
        Step::Authenticate,
        Step::CreateCluster,
        Step::ResolveEndpoint,
        Step::CreateNodePool,
        Step::IssueCredentials,
        Step::ProbeReachability,
        Step::DeployWorkload,
        Step::GenerateLoad,
        Step::ObserveScaling,
        Step::MutateNodePool,
        Step::Teardown,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Step::Authenticate => 1,
            Step::CreateCluster => 2,
            Step::ResolveEndpoint => 3,
            Step::CreateNodePool => 4,
            Step::IssueCredentials => 5,
            Step::ProbeReachability => 6,
            Step::DeployWorkload => 7,
            Step::GenerateLoad => 8,
            Step::ObserveScaling => 9,
            Step::MutateNodePool => 10,
            Step::Teardown => 11,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Authenticate => "Test client",
            Step::CreateCluster => "Create cluster",
            Step::ResolveEndpoint => "Resolve API endpoint",
            Step::CreateNodePool => "Create node pool",
            Step::IssueCredentials => "Create key pair",
            Step::ProbeReachability => "Wait for cluster access",
            Step::DeployWorkload => "Deploy test app",
            Step::GenerateLoad => "Produce load",
            Step::ObserveScaling => "Observe node pool scaling",
            Step::MutateNodePool => "Modify node pool",
            Step::Teardown => "Delete cluster",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.name())
    }
}

#[derive(Error, Debug)]
pub enum UatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not talk to the API: {0}")]
    Authentication(ApiError),

    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("{0}")]
    NotYetAvailable(ApiError),

    #[error(transparent)]
    Process(#[from] ShellError),

    #[error("{what} did not succeed within {elapsed:?} ({attempts} attempts), last error: {last}")]
    ConvergenceTimeout {
        what: String,
        attempts: u32,
        elapsed: Duration,
        last: String,
    },

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Kubeconfig(#[from] KubeconfigError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiError> for UatError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::ServiceUnavailable { .. } => UatError::NotYetAvailable(err),
            err if err.is_unauthorized() => UatError::Authentication(err),
            err => UatError::Api(err),
        }
    }
}

impl UatError {
    pub fn kind(&self) -> &'static str {
        match self {
            UatError::Config(e) => e.kind(),
            UatError::Authentication(_) => "authentication_failed",
            UatError::Assertion(_) => "assertion_failed",
            UatError::NotYetAvailable(_) => "not_yet_available",
            UatError::Process(e) => e.kind(),
            UatError::ConvergenceTimeout { .. } => "convergence_timeout",
            UatError::Api(_) => "request_failed",
            UatError::Kubeconfig(_) | UatError::Io { .. } => "io",
        }
    }

    /// What the operator can try next
    pub fn docs(&self) -> Option<&'static str> {
        match self {
            UatError::Config(_) => {
                Some("Run 'api-acceptance-test env' to see the environment overrides.")
            }
            UatError::Authentication(_) => {
                Some("Check --endpoint, --scheme and --token against the installation.")
            }
            UatError::NotYetAvailable(_) => Some(
                "The cluster cannot serve this request yet. Wait a few minutes, then run again with --cluster-id.",
            ),
            UatError::Process(ShellError::CouldNotStart { .. }) => {
                Some("Make sure kubectl is installed and on the PATH.")
            }
            UatError::ConvergenceTimeout { .. } => Some(
                "Inspect the cluster with the generated kubeconfig, or raise --reachability-timeout / --ingress-timeout.",
            ),
            _ => None,
        }
    }
}

/// A fatal error and the step it stopped the run in
#[derive(Error, Debug)]
#[error("{step} failed: {source}")]
pub struct RunError {
    pub step: Step,
    #[source]
    pub source: UatError,
}

impl RunError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn docs(&self) -> Option<&'static str> {
        self.source.docs()
    }
}

/// Attach the current step to a step's error
pub(crate) trait InStep<T> {
    fn in_step(self, step: Step) -> Result<T, RunError>;
}

impl<T, E: Into<UatError>> InStep<T> for Result<T, E> {
    fn in_step(self, step: Step) -> Result<T, RunError> {
        self.map_err(|e| RunError {
            step,
            source: e.into(),
        })
    }
}
