//! Step sequencer
//!
//! Drives the collaborators through the fixed sequence of steps. Soft
//! findings are printed and collected; the first fatal error stops the run
//! and is returned together with the step it happened in.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::context::{ClusterHandle, NodePoolHandle, RunContext, RunReport};
use super::error::{InStep, RunError, Step, UatError};
use super::workload::{
    base_domain, cluster_name, random_suffix, render_manifest, test_app_url,
    TEST_APP_DEPLOYMENT, TEST_APP_REPLICAS,
};
use crate::api::models::{
    AddClusterRequest, AddKeyPairRequest, AddNodePoolRequest, ModifyNodePoolRequest,
};
use crate::api::ClusterApi;
use crate::assertions::{
    validate_cluster_creation, validate_key_pair, validate_node_pool_creation,
    validate_node_pool_rename, validate_node_pool_scaling, AssertionError,
};
use crate::http::HttpProbe;
use crate::kubeconfig::{kubeconfig_file_name, write_kubeconfig_file, Credentials};
use crate::load::LoadLauncher;
use crate::output;
use crate::retry::{ConstantBackoff, RetryError};
use crate::shell::{kubectl_args, CommandOutput, ProcessRunner};

/// Name the first node pool is renamed to
pub const RENAMED_NODE_POOL: &str = "First test node pool";

/// Scaling bounds the node pool is changed to
pub const MODIFIED_SCALING: (i64, i64) = (2, 2);

const KUBECTL: &str = "kubectl";

/// Runs the acceptance test against injected collaborators
pub struct Sequencer {
    api: Arc<dyn ClusterApi>,
    shell: Arc<dyn ProcessRunner>,
    http: Arc<dyn HttpProbe>,
    load: Arc<dyn LoadLauncher>,
}

impl Sequencer {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        shell: Arc<dyn ProcessRunner>,
        http: Arc<dyn HttpProbe>,
        load: Arc<dyn LoadLauncher>,
    ) -> Self {
        Self {
            api,
            shell,
            http,
            load,
        }
    }

    /// Run every step in order
    ///
    /// When a fatal error happens after this run created a cluster, the
    /// cluster is deleted before the error is returned, unless it is to be kept.
    pub async fn run(&self, mut ctx: RunContext) -> Result<RunReport, RunError> {
        match self.run_steps(&mut ctx).await {
            Ok(()) => Ok(ctx.into_report()),
            Err(err) => {
                if err.step != Step::Teardown {
                    self.cleanup_after_failure(&mut ctx).await;
                }
                Err(err)
            }
        }
    }

    async fn run_steps(&self, ctx: &mut RunContext) -> Result<(), RunError> {
        begin(Step::Authenticate);
        self.authenticate(ctx).await.in_step(Step::Authenticate)?;
        ctx.lap(Step::Authenticate.name());

        begin(Step::CreateCluster);
        let cluster = self.provision_cluster(ctx).await.in_step(Step::CreateCluster)?;
        ctx.lap(Step::CreateCluster.name());

        begin(Step::ResolveEndpoint);
        let cluster = self
            .resolve_endpoint(ctx, cluster)
            .await
            .in_step(Step::ResolveEndpoint)?;
        ctx.lap(Step::ResolveEndpoint.name());

        begin(Step::CreateNodePool);
        let node_pool = self
            .provision_node_pool(ctx, &cluster)
            .await
            .in_step(Step::CreateNodePool)?;
        ctx.lap(Step::CreateNodePool.name());

        begin(Step::IssueCredentials);
        let kubeconfig = self
            .issue_credentials(ctx, &cluster)
            .await
            .in_step(Step::IssueCredentials)?;
        ctx.lap(Step::IssueCredentials.name());

        begin(Step::ProbeReachability);
        self.probe_reachability(ctx, &kubeconfig)
            .await
            .in_step(Step::ProbeReachability)?;
        ctx.lap(Step::ProbeReachability.name());

        begin(Step::DeployWorkload);
        let url = self
            .deploy_workload(ctx, &cluster, &kubeconfig)
            .await
            .in_step(Step::DeployWorkload)?;
        ctx.lap(Step::DeployWorkload.name());

        begin(Step::GenerateLoad);
        self.generate_load(ctx, &url, &kubeconfig).await;
        ctx.lap(Step::GenerateLoad.name());

        begin(Step::ObserveScaling);
        self.observe_scaling(ctx, &cluster, &node_pool).await;
        ctx.lap(Step::ObserveScaling.name());

        begin(Step::MutateNodePool);
        self.mutate_node_pool(ctx, &cluster, &node_pool)
            .await
            .in_step(Step::MutateNodePool)?;
        ctx.lap(Step::MutateNodePool.name());

        begin(Step::Teardown);
        self.teardown(ctx, &cluster, &node_pool)
            .await
            .in_step(Step::Teardown)?;
        ctx.lap(Step::Teardown.name());

        Ok(())
    }

    async fn authenticate(&self, ctx: &mut RunContext) -> Result<(), UatError> {
        let info = self
            .api
            .get_info()
            .await
            .map_err(UatError::Authentication)?;

        output::print_success("Client works");
        output::print_info(&format!(
            "Installation name: {}",
            info.general.installation_name
        ));
        debug!(
            "Provider {}, datacenter {}",
            info.general.provider, info.general.datacenter
        );
        ctx.installation_name = Some(info.general.installation_name);
        Ok(())
    }

    async fn provision_cluster(&self, ctx: &mut RunContext) -> Result<ClusterHandle, UatError> {
        if let Some(id) = ctx.config.cluster_id.clone() {
            output::print_info(&format!("Using existing cluster {id}"));
            let handle = ClusterHandle {
                id,
                api_endpoint: String::new(),
            };
            ctx.cluster = Some(handle.clone());
            return Ok(handle);
        }

        let name = cluster_name(
            ctx.config.release_version.as_deref(),
            Utc::now(),
            &random_suffix(),
        );
        let request = AddClusterRequest {
            owner: ctx.config.owner_org.clone(),
            name: name.clone(),
            release_version: ctx.config.release_version.clone().unwrap_or_default(),
        };
        info!("Creating cluster {:?} for {}", name, request.owner);

        let details = self.api.create_cluster(&request).await?;
        ctx.record(validate_cluster_creation(&details, &name))?;

        let handle = ClusterHandle {
            id: details.id,
            api_endpoint: details.api_endpoint,
        };
        ctx.created.cluster = true;
        ctx.cluster = Some(handle.clone());
        output::print_success(&format!("Created cluster {}", handle.id));
        Ok(handle)
    }

    async fn resolve_endpoint(
        &self,
        ctx: &mut RunContext,
        mut cluster: ClusterHandle,
    ) -> Result<ClusterHandle, UatError> {
        if cluster.api_endpoint.is_empty() {
            debug!("Fetching details of cluster {}", cluster.id);
            let details = self.api.get_cluster(&cluster.id).await?;
            if details.api_endpoint.is_empty() {
                return Err(AssertionError {
                    field: "api_endpoint".to_string(),
                    message: format!("Cluster {} has no API endpoint", cluster.id),
                }
                .into());
            }
            cluster.api_endpoint = details.api_endpoint;
        }

        output::print_info(&format!("API endpoint: {}", cluster.api_endpoint));
        ctx.cluster = Some(cluster.clone());
        Ok(cluster)
    }

    async fn provision_node_pool(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
    ) -> Result<NodePoolHandle, UatError> {
        if let Some(id) = ctx.config.first_node_pool_id.clone() {
            output::print_info(&format!("Using existing node pool {id}"));
            let handle = NodePoolHandle::new(id);
            ctx.node_pool = Some(handle.clone());
            return Ok(handle);
        }

        let node_pool = self
            .api
            .create_node_pool(&cluster.id, &AddNodePoolRequest::default())
            .await?;
        ctx.record(validate_node_pool_creation(&node_pool))?;

        let handle = NodePoolHandle::new(node_pool.id);
        ctx.created.node_pool = true;
        ctx.node_pool = Some(handle.clone());
        output::print_success(&format!("Created node pool {}", handle.id));

        sleep(ctx.config.timings.node_pool_settle).await;
        Ok(handle)
    }

    async fn issue_credentials(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
    ) -> Result<String, UatError> {
        let key_pair = self
            .api
            .create_key_pair(&cluster.id, &AddKeyPairRequest::default())
            .await?;
        ctx.record(validate_key_pair(&key_pair))?;

        let path = ctx
            .config
            .work_dir
            .join(kubeconfig_file_name(&cluster.id, &key_pair.id));
        let credentials = Credentials {
            certificate_authority: &key_pair.certificate_authority_data,
            client_certificate: &key_pair.client_certificate_data,
            client_key: &key_pair.client_key_data,
        };
        write_kubeconfig_file(&path, &cluster.api_endpoint, &credentials)?;

        output::print_success(&format!(
            "Created key pair {}, kubeconfig written to {}",
            key_pair.id,
            path.display()
        ));
        let kubeconfig = path.to_string_lossy().to_string();
        ctx.kubeconfig_path = Some(path);
        Ok(kubeconfig)
    }

    async fn probe_reachability(
        &self,
        ctx: &mut RunContext,
        kubeconfig: &str,
    ) -> Result<(), UatError> {
        let timings = &ctx.config.timings;
        let backoff = ConstantBackoff::new(timings.reachability_interval);
        let shell = &self.shell;
        let args = kubectl_args(kubeconfig, &["get", "nodes"]);
        let args = args.as_slice();

        let started = Instant::now();
        let nodes = backoff
            .retry_until(timings.reachability_timeout, || {
                shell.run(KUBECTL, &[], args)
            })
            .await
            .map_err(|e| convergence_timeout("kubectl get nodes", e))?;

        output::print_success(&format!(
            "Cluster accepts kubectl requests after {:?}",
            started.elapsed()
        ));
        output::print_info(&command_summary("kubectl get nodes", &nodes));
        Ok(())
    }

    async fn deploy_workload(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
        kubeconfig: &str,
    ) -> Result<String, UatError> {
        let domain = base_domain(&cluster.api_endpoint);
        let manifest = ctx.config.rendered_manifest_path();
        render_manifest(&ctx.config.manifest_template, &manifest, &domain)?;

        let manifest_arg = manifest.to_string_lossy().to_string();
        let applied = self
            .shell
            .run(
                KUBECTL,
                &[],
                &kubectl_args(kubeconfig, &["apply", "-f", manifest_arg.as_str()]),
            )
            .await?;
        output::print_success("Test app deployed");
        output::print_info(&command_summary("kubectl apply", &applied));

        let url = test_app_url(&domain);
        let timings = &ctx.config.timings;
        let backoff = ConstantBackoff::new(timings.ingress_interval);
        let http = &self.http;
        let target = url.as_str();

        let started = Instant::now();
        backoff
            .retry_until(timings.ingress_timeout, || http.probe(target))
            .await
            .map_err(|e| convergence_timeout(&format!("ingress at {url}"), e))?;

        output::print_success(&format!(
            "Ingress at {} reached after {:?}",
            url,
            started.elapsed()
        ));
        ctx.test_app_url = Some(url.clone());
        Ok(url)
    }

    async fn generate_load(&self, ctx: &mut RunContext, url: &str, kubeconfig: &str) {
        self.load.launch(url);
        output::print_success(&format!("Producing load on {url}"));

        let replicas = format!("--replicas={TEST_APP_REPLICAS}");
        let args = kubectl_args(kubeconfig, &["scale", replicas.as_str(), TEST_APP_DEPLOYMENT]);
        match self.shell.run(KUBECTL, &[], &args).await {
            Ok(_) => output::print_success(&format!(
                "Scaled {TEST_APP_DEPLOYMENT} to {TEST_APP_REPLICAS} replicas"
            )),
            Err(e) => ctx.soft(
                "replicas",
                format!("Could not scale {TEST_APP_DEPLOYMENT}: {e}"),
            ),
        }
    }

    async fn observe_scaling(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
        node_pool: &NodePoolHandle,
    ) {
        let timings = ctx.config.timings.clone();
        for round in 1..=timings.observation_rounds {
            sleep(timings.observation_interval).await;

            match self.api.get_node_pool(&cluster.id, &node_pool.id).await {
                Ok(details) => {
                    let status = details.status.unwrap_or_default();
                    output::print_info(&format!(
                        "Node pool details - nodes desired: {}, nodes in state ready: {}",
                        status.nodes, status.nodes_ready
                    ));
                    if let Some(handle) = ctx.node_pool.as_mut() {
                        handle.nodes = Some(status.nodes);
                        handle.nodes_ready = Some(status.nodes_ready);
                    }
                }
                Err(e) => ctx.soft(
                    "status",
                    format!("Could not fetch node pool details (round {round}): {e}"),
                ),
            }
        }
    }

    async fn mutate_node_pool(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
        node_pool: &NodePoolHandle,
    ) -> Result<(), UatError> {
        let rename = ModifyNodePoolRequest::rename(RENAMED_NODE_POOL);
        match self
            .api
            .modify_node_pool(&cluster.id, &node_pool.id, &rename)
            .await
        {
            Ok(details) => {
                let report = validate_node_pool_rename(&details, RENAMED_NODE_POOL);
                if report.is_clean() {
                    output::print_success(&format!("Renamed node pool to {RENAMED_NODE_POOL:?}"));
                }
                ctx.record(report)?;
            }
            Err(e) => ctx.soft("name", format!("Could not rename node pool: {e}")),
        }

        let (min, max) = MODIFIED_SCALING;
        let scale = ModifyNodePoolRequest::scale(min, max);
        match self
            .api
            .modify_node_pool(&cluster.id, &node_pool.id, &scale)
            .await
        {
            Ok(details) => {
                let report = validate_node_pool_scaling(&details, min, max);
                if report.is_clean() {
                    output::print_success(&format!(
                        "Changed node pool scaling to min {min}, max {max}"
                    ));
                }
                ctx.record(report)?;
            }
            Err(e) => ctx.soft("scaling", format!("Could not scale node pool: {e}")),
        }

        Ok(())
    }

    async fn teardown(
        &self,
        ctx: &mut RunContext,
        cluster: &ClusterHandle,
        node_pool: &NodePoolHandle,
    ) -> Result<(), UatError> {
        let policy = ctx.config.teardown;
        if policy.keep_cluster {
            output::print_info(&format!("Keeping cluster {}", cluster.id));
            return Ok(());
        }

        sleep(ctx.config.timings.teardown_delay).await;

        // With required cleanup the first failure is returned, but only after
        // the cluster delete has been attempted.
        let mut first_error: Option<UatError> = None;

        if policy.delete_node_pool && ctx.created.node_pool {
            match self.api.delete_node_pool(&cluster.id, &node_pool.id).await {
                Ok(()) => {
                    ctx.created.node_pool = false;
                    output::print_success(&format!("Deleted node pool {}", node_pool.id));
                }
                Err(e) if policy.require_cleanup => {
                    output::complain(&format!("Could not delete node pool {}: {e}", node_pool.id));
                    first_error = Some(e.into());
                }
                Err(e) => ctx.soft("node_pool", format!("Could not delete node pool: {e}")),
            }
        }

        if !ctx.created.cluster {
            output::print_info(&format!(
                "Cluster {} was not created by this run, leaving it in place",
                cluster.id
            ));
            return first_error.map_or(Ok(()), Err);
        }

        match self.api.delete_cluster(&cluster.id).await {
            Ok(()) => {
                ctx.created.cluster = false;
                ctx.created.node_pool = false;
                output::print_success(&format!("Deleted cluster {}", cluster.id));
            }
            Err(e) if policy.require_cleanup => {
                output::complain(&format!("Could not delete cluster {}: {e}", cluster.id));
                if first_error.is_none() {
                    first_error = Some(e.into());
                }
            }
            Err(e) => ctx.soft("cluster", format!("Could not delete cluster: {e}")),
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Best effort: errors are reported, never returned
    async fn cleanup_after_failure(&self, ctx: &mut RunContext) {
        if ctx.config.teardown.keep_cluster || !ctx.created.cluster {
            return;
        }
        let Some(cluster) = ctx.cluster.clone() else {
            return;
        };

        warn!("Run failed, deleting cluster {}", cluster.id);
        output::print_info(&format!("Deleting cluster {} after failure", cluster.id));
        sleep(ctx.config.timings.teardown_delay).await;

        match self.api.delete_cluster(&cluster.id).await {
            Ok(()) => {
                ctx.created.cluster = false;
                ctx.created.node_pool = false;
                output::print_success(&format!("Deleted cluster {}", cluster.id));
            }
            Err(e) => output::complain(&format!(
                "Could not delete cluster {}, delete it manually: {e}",
                cluster.id
            )),
        }
    }
}

fn begin(step: Step) {
    output::print_step(step.number(), step.name());
}

/// Exit code and output of a command that succeeded
fn command_summary(what: &str, out: &CommandOutput) -> String {
    let stdout = out.stdout.trim_end();
    if stdout.is_empty() {
        format!("{what} exited with code {}", out.exit_code)
    } else {
        format!("{what} exited with code {}:\n{stdout}", out.exit_code)
    }
}

fn convergence_timeout<E: std::fmt::Display>(what: &str, err: RetryError<E>) -> UatError {
    match err {
        RetryError::TimedOut {
            attempts,
            elapsed,
            last,
        } => UatError::ConvergenceTimeout {
            what: what.to_string(),
            attempts,
            elapsed,
            last: last.to_string(),
        },
    }
}
