//! Response assertions
//!
//! Each validator compares one API response with the expected defaults and
//! returns a [`Report`] of severity-tagged findings. Validators never print or
//! abort; the caller emits soft findings and stops on the first fatal one.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::api::models::{ClusterDetails, KeyPair, NodePool};
use crate::output;

/// Expected node pool defaults
pub const DEFAULT_SCALING_MIN: i64 = 3;
pub const DEFAULT_SCALING_MAX: i64 = 10;
pub const DEFAULT_AVAILABILITY_ZONES: usize = 1;

/// How bad a failed check is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Later steps cannot run
    Fatal,
    /// Logged, the run continues
    Soft,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Soft => write!(f, "soft"),
        }
    }
}

/// One failed check
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Response field the check looked at, e.g. `scaling.min`
    pub field: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A fatal finding, surfaced as an error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    pub field: String,
    pub message: String,
}

impl From<&Finding> for AssertionError {
    fn from(finding: &Finding) -> Self {
        Self {
            field: finding.field.clone(),
            message: finding.message.clone(),
        }
    }
}

/// Findings and informational notes for one response
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    findings: Vec<Finding>,
    notes: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn soft(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Soft,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn fatal(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Fatal,
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a soft finding unless `ok`
    pub fn check(&mut self, ok: bool, field: &str, message: impl FnOnce() -> String) {
        if !ok {
            self.soft(field, message());
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Fatal finding when an identifier later steps depend on is empty
    pub fn require(&mut self, value: &str, what: &str) {
        if let Err(missing) = require_id(value, what) {
            self.fatal(missing.field, missing.message);
        }
    }

    #[cfg(test)]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    #[cfg(test)]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn soft_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Soft)
    }

    pub fn first_fatal(&self) -> Option<&Finding> {
        self.findings
            .iter()
            .find(|f| f.severity == Severity::Fatal)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Print notes and soft findings, one line each
    pub fn emit(&self) {
        for note in &self.notes {
            output::print_info(note);
        }
        for finding in self.soft_findings() {
            output::complain(&finding.message);
        }
    }

    /// Fail on the first fatal finding, otherwise hand the report back
    pub fn into_result(self) -> Result<Self, AssertionError> {
        match self.first_fatal() {
            Some(finding) => Err(finding.into()),
            None => Ok(self),
        }
    }
}

/// An identifier later steps depend on must not be empty
pub fn require_id(value: &str, what: &str) -> Result<String, AssertionError> {
    if value.is_empty() {
        return Err(AssertionError {
            field: "id".to_string(),
            message: format!("{what} ID is missing in the response"),
        });
    }
    Ok(value.to_string())
}

/// Cluster creation response against the request that produced it
pub fn validate_cluster_creation(cluster: &ClusterDetails, requested_name: &str) -> Report {
    let mut report = Report::new();

    report.check(cluster.name == requested_name, "name", || {
        format!(
            "Cluster name is not '{}' but '{}'",
            requested_name, cluster.name
        )
    });
    report.check(!cluster.api_endpoint.is_empty(), "api_endpoint", || {
        "Cluster api_endpoint is empty".to_string()
    });

    match &cluster.master {
        None => report.soft("master", "Cluster master is empty"),
        Some(master) if master.availability_zone.is_empty() => {
            report.note("'master.availability_zone' is empty")
        }
        Some(master) => report.note(format!(
            "'master.availability_zone' is {}",
            master.availability_zone
        )),
    }

    match &cluster.master_nodes {
        None => report.soft("master_nodes", "Cluster master_nodes is empty"),
        Some(nodes) => match &nodes.availability_zones {
            None => report.soft(
                "master_nodes.availability_zones",
                "Cluster master_nodes.availability_zones is empty",
            ),
            Some(zones) => {
                report.note(format!(
                    "'master_nodes.availability_zones' is {:?}",
                    zones
                ));
                report.note(format!(
                    "'master_nodes.high_availability' is {}",
                    nodes.high_availability
                ));
                report.note(format!("'master_nodes.num_ready' is {}", nodes.num_ready));
            }
        },
    }

    if cluster.release_version.is_empty() {
        report.soft("release_version", "Cluster release_version is empty");
    } else {
        report.note(format!("'release_version' is {}", cluster.release_version));
    }
    report.check(!cluster.create_date.is_empty(), "create_date", || {
        "Cluster create_date is empty".to_string()
    });
    report.check(!cluster.owner.is_empty(), "owner", || {
        "Cluster owner is empty".to_string()
    });

    report.require(&cluster.id, "Cluster");

    report
}

/// Node pool created with an empty spec must carry the defaults
pub fn validate_node_pool_creation(node_pool: &NodePool) -> Report {
    let mut report = Report::new();

    report.check(!node_pool.name.is_empty(), "name", || {
        "'name' is missing in node pool creation response".to_string()
    });

    let zones = node_pool.availability_zones.len();
    if zones == 0 {
        report.soft(
            "availability_zones",
            "'availability_zones' in node pool creation response is empty",
        );
    } else if zones != DEFAULT_AVAILABILITY_ZONES {
        report.soft(
            "availability_zones",
            format!(
                "'availability_zones' has {} items instead of {}",
                zones, DEFAULT_AVAILABILITY_ZONES
            ),
        );
    }

    match &node_pool.scaling {
        None => report.soft(
            "scaling",
            "'scaling' is missing in node pool creation response",
        ),
        Some(scaling) => {
            report.check(scaling.min == DEFAULT_SCALING_MIN, "scaling.min", || {
                format!(
                    "'scaling.min' in node pool creation response is {} instead of {}",
                    scaling.min, DEFAULT_SCALING_MIN
                )
            });
            report.check(scaling.max == DEFAULT_SCALING_MAX, "scaling.max", || {
                format!(
                    "'scaling.max' in node pool creation response is {} instead of {}",
                    scaling.max, DEFAULT_SCALING_MAX
                )
            });
        }
    }

    match &node_pool.node_spec {
        None => report.soft(
            "node_spec",
            "'node_spec' is missing in node pool creation response",
        ),
        Some(spec) => {
            match &spec.aws {
                None => report.soft(
                    "node_spec.aws",
                    "'node_spec.aws' is missing in node pool creation response",
                ),
                Some(aws) if aws.instance_type.is_empty() => report.soft(
                    "node_spec.aws.instance_type",
                    "'node_spec.aws.instance_type' is missing in node pool creation response",
                ),
                Some(aws) => {
                    report.note(format!("'node_spec.aws.instance_type' is {}", aws.instance_type))
                }
            }

            match &spec.volume_sizes_gb {
                None => report.soft(
                    "node_spec.volume_sizes_gb",
                    "'node_spec.volume_sizes_gb' is missing in node pool creation response",
                ),
                Some(sizes) => {
                    report.check(sizes.docker != 0, "node_spec.volume_sizes_gb.docker", || {
                        "'node_spec.volume_sizes_gb.docker' in node pool creation response is zero"
                            .to_string()
                    });
                    report.check(
                        sizes.kubelet != 0,
                        "node_spec.volume_sizes_gb.kubelet",
                        || {
                            "'node_spec.volume_sizes_gb.kubelet' in node pool creation response is zero"
                                .to_string()
                        },
                    );
                }
            }
        }
    }

    report.require(&node_pool.id, "Node pool");

    report
}

/// Modification response must echo the new name
pub fn validate_node_pool_rename(node_pool: &NodePool, name: &str) -> Report {
    let mut report = Report::new();
    report.check(node_pool.name == name, "name", || {
        format!("'name' in node pool modification response is not {name:?}")
    });
    report
}

/// Modification response must echo the new scaling bounds
pub fn validate_node_pool_scaling(node_pool: &NodePool, min: i64, max: i64) -> Report {
    let mut report = Report::new();
    match &node_pool.scaling {
        None => report.soft(
            "scaling",
            "'scaling' is missing in node pool modification response",
        ),
        Some(scaling) => {
            report.check(scaling.min == min, "scaling.min", || {
                format!("'scaling.min' in node pool modification response is not {min}")
            });
            report.check(scaling.max == max, "scaling.max", || {
                format!("'scaling.max' in node pool modification response is not {max}")
            });
        }
    }
    report
}

/// Key pair response must have an ID and certificate material
pub fn validate_key_pair(key_pair: &KeyPair) -> Report {
    let mut report = Report::new();
    report.check(
        !key_pair.certificate_authority_data.is_empty(),
        "certificate_authority_data",
        || "'certificate_authority_data' in key pair creation response is empty".to_string(),
    );
    report.check(
        !key_pair.client_certificate_data.is_empty(),
        "client_certificate_data",
        || "'client_certificate_data' in key pair creation response is empty".to_string(),
    );
    report.check(
        !key_pair.client_key_data.is_empty(),
        "client_key_data",
        || "'client_key_data' in key pair creation response is empty".to_string(),
    );
    report.require(&key_pair.id, "Key pair");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{
        AwsNodeSpec, Master, MasterNodes, NodeSpec, Scaling, VolumeSizes,
    };

    fn default_node_pool() -> NodePool {
        NodePool {
            id: "a7k".to_string(),
            name: "Unnamed node pool".to_string(),
            availability_zones: vec!["a".to_string()],
            scaling: Some(Scaling { min: 3, max: 10 }),
            node_spec: Some(NodeSpec {
                aws: Some(AwsNodeSpec {
                    instance_type: "m5.xlarge".to_string(),
                }),
                volume_sizes_gb: Some(VolumeSizes {
                    docker: 100,
                    kubelet: 100,
                }),
            }),
            status: None,
        }
    }

    fn complete_cluster(name: &str) -> ClusterDetails {
        ClusterDetails {
            id: "f9x2k".to_string(),
            name: name.to_string(),
            api_endpoint: "https://api.f9x2k.k8s.example.com".to_string(),
            create_date: "2026-10-18T10:00:00Z".to_string(),
            owner: "giantswarm".to_string(),
            release_version: "11.0.0".to_string(),
            master: Some(Master {
                availability_zone: "eu-central-1a".to_string(),
            }),
            master_nodes: Some(MasterNodes {
                availability_zones: Some(vec!["eu-central-1a".to_string()]),
                high_availability: false,
                num_ready: 0,
            }),
        }
    }

    #[test]
    fn test_default_node_pool_passes_silently() {
        let report = validate_node_pool_creation(&default_node_pool());
        assert!(report.is_clean(), "{:?}", report.findings());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_wrong_scaling_min_is_one_soft_finding() {
        let mut np = default_node_pool();
        np.scaling = Some(Scaling { min: 5, max: 10 });

        let report = validate_node_pool_creation(&np);
        let soft: Vec<&Finding> = report.soft_findings().collect();
        assert_eq!(soft.len(), 1);
        assert_eq!(soft[0].field, "scaling.min");
        assert!(soft[0].message.contains("scaling.min"));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_multiple_zones_reported() {
        let mut np = default_node_pool();
        np.availability_zones = vec!["a".to_string(), "b".to_string()];

        let report = validate_node_pool_creation(&np);
        assert_eq!(report.findings().len(), 1);
        assert!(report.findings()[0].message.contains("2 items instead of 1"));
    }

    #[test]
    fn test_missing_node_spec_parts() {
        let mut np = default_node_pool();
        np.node_spec = Some(NodeSpec {
            aws: Some(AwsNodeSpec::default()),
            volume_sizes_gb: Some(VolumeSizes {
                docker: 0,
                kubelet: 100,
            }),
        });

        let report = validate_node_pool_creation(&np);
        let fields: Vec<&str> = report.findings().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["node_spec.aws.instance_type", "node_spec.volume_sizes_gb.docker"]
        );
    }

    #[test]
    fn test_missing_node_pool_id_is_fatal() {
        let mut np = default_node_pool();
        np.id.clear();

        let err = validate_node_pool_creation(&np).into_result().unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_complete_cluster_is_clean() {
        let report = validate_cluster_creation(&complete_cluster("uat"), "uat");
        assert!(report.is_clean(), "{:?}", report.findings());
        assert!(!report.notes().is_empty());
    }

    #[test]
    fn test_cluster_shape_mismatches_are_soft() {
        let mut cluster = complete_cluster("Unnamed cluster");
        cluster.api_endpoint.clear();
        cluster.master_nodes = None;

        let report = validate_cluster_creation(&cluster, "uat");
        assert_eq!(report.soft_findings().count(), 3);
        assert!(report.first_fatal().is_none());
    }

    #[test]
    fn test_missing_cluster_id_is_fatal() {
        let mut cluster = complete_cluster("uat");
        cluster.id.clear();

        let report = validate_cluster_creation(&cluster, "uat");
        let fatal = report.first_fatal().unwrap();
        assert_eq!(fatal.field, "id");
        assert_eq!(fatal.message, "Cluster ID is missing in the response");
    }

    #[test]
    fn test_scaling_validation_checks_both_bounds() {
        let mut np = default_node_pool();
        np.scaling = Some(Scaling { min: 2, max: 10 });

        let report = validate_node_pool_scaling(&np, 2, 2);
        let fields: Vec<&str> = report.findings().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["scaling.max"]);
    }

    #[test]
    fn test_rename_validation() {
        let np = default_node_pool();
        assert!(validate_node_pool_rename(&np, "Unnamed node pool").is_clean());
        assert_eq!(
            validate_node_pool_rename(&np, "First test node pool")
                .findings()
                .len(),
            1
        );
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("abc", "Cluster").unwrap(), "abc");
        let err = require_id("", "Cluster").unwrap_err();
        assert_eq!(err.message, "Cluster ID is missing in the response");
    }

    #[test]
    fn test_key_pair_without_id_is_fatal() {
        let kp = KeyPair {
            certificate_authority_data: "ca".to_string(),
            client_certificate_data: "cert".to_string(),
            client_key_data: "key".to_string(),
            ..Default::default()
        };
        let report = validate_key_pair(&kp);
        assert!(report.soft_findings().next().is_none());
        let err = report.into_result().unwrap_err();
        assert_eq!(err.message, "Key pair ID is missing in the response");
    }
}
