//! State carried through one acceptance run

use std::path::PathBuf;
use std::time::Duration;

use crate::assertions::{AssertionError, Finding, Report};
use crate::config::RunConfig;
use crate::utils::Stopwatch;

/// A cluster the run works with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterHandle {
    pub id: String,
    /// May be empty right after creation
    pub api_endpoint: String,
}

/// A node pool the run works with, plus the last observed node counts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePoolHandle {
    pub id: String,
    pub nodes: Option<i64>,
    pub nodes_ready: Option<i64>,
}

impl NodePoolHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Resources this run created and has not deleted yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreatedResources {
    pub cluster: bool,
    pub node_pool: bool,
}

/// Mutable state of a run, owned by the sequencer
#[derive(Debug)]
pub struct RunContext {
    pub config: RunConfig,
    pub installation_name: Option<String>,
    pub cluster: Option<ClusterHandle>,
    pub node_pool: Option<NodePoolHandle>,
    pub kubeconfig_path: Option<PathBuf>,
    pub test_app_url: Option<String>,
    pub created: CreatedResources,
    findings: Vec<Finding>,
    stopwatch: Stopwatch,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            installation_name: None,
            cluster: None,
            node_pool: None,
            kubeconfig_path: None,
            test_app_url: None,
            created: CreatedResources::default(),
            findings: Vec::new(),
            stopwatch: Stopwatch::new(),
        }
    }

    /// Print a report, keep its soft findings, fail on a fatal one
    pub fn record(&mut self, report: Report) -> Result<(), AssertionError> {
        report.emit();
        self.findings.extend(report.soft_findings().cloned());
        report.into_result().map(|_| ())
    }

    /// Record a single soft finding
    pub fn soft(&mut self, field: &str, message: impl Into<String>) {
        let mut report = Report::new();
        report.soft(field, message);
        report.emit();
        self.findings.extend(report.soft_findings().cloned());
    }

    #[cfg(test)]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn lap(&mut self, label: &str) -> Duration {
        self.stopwatch.lap(label)
    }

    pub fn into_report(self) -> RunReport {
        let node_counts = self
            .node_pool
            .as_ref()
            .and_then(|np| Some((np.nodes?, np.nodes_ready?)));
        RunReport {
            installation_name: self.installation_name,
            cluster_id: self.cluster.map(|c| c.id),
            node_pool_id: self.node_pool.map(|np| np.id),
            node_counts,
            kubeconfig_path: self.kubeconfig_path,
            test_app_url: self.test_app_url,
            findings: self.findings,
            total: self.stopwatch.total(),
            step_durations: self.stopwatch.into_laps(),
        }
    }
}

/// Outcome of a run that reached the end
#[derive(Clone, Debug)]
pub struct RunReport {
    pub installation_name: Option<String>,
    pub cluster_id: Option<String>,
    pub node_pool_id: Option<String>,
    /// Desired and ready nodes at the last observation
    pub node_counts: Option<(i64, i64)>,
    pub kubeconfig_path: Option<PathBuf>,
    pub test_app_url: Option<String>,
    /// Soft findings in the order they were seen
    pub findings: Vec<Finding>,
    pub total: Duration,
    pub step_durations: Vec<(String, Duration)>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
