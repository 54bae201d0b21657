//! API acceptance test
//!
//! Creates a cluster and a node pool through the cluster management API,
//! checks the responses, gets a kubeconfig, deploys a test app behind an
//! ingress, puts load on it, modifies the node pool and deletes the cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Full run against an installation
//! api-acceptance-test run --endpoint https://api.g8s.example.com --token $TOKEN
//!
//! # Reuse an existing cluster and keep it afterwards
//! api-acceptance-test run --cluster-id f9x2k --keep-cluster
//!
//! # Environment overrides
//! api-acceptance-test env
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

mod api;
mod assertions;
mod cli;
mod config;
mod http;
mod kubeconfig;
mod load;
mod output;
mod retry;
mod shell;
mod uat;
mod utils;

use api::GiantSwarmClient;
use cli::{Args, Command, RunArgs};
use config::{EnvConfig, RunConfig, ENV_PREFIX};
use http::HttpClient;
use load::{BackgroundLoad, LoadConfig};
use shell::SystemShell;
use uat::{RunContext, RunReport, Sequencer, UatError};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Command::Run(run_args) => Ok(run(run_args).await),
        Command::Env => {
            config::print_env_help();
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let env = EnvConfig::load();
    let config = match args.into_config(&env) {
        Ok(config) => config,
        Err(e) => {
            let message = e.to_string();
            let err = UatError::Config(e);
            output::print_failure_summary(err.kind(), err.docs(), &message);
            return ExitCode::FAILURE;
        }
    };

    init_logger(LogLevel::from_verbose(config.enable_logging));
    if env.has_any() {
        debug!("Applied {}_* environment overrides", ENV_PREFIX);
    }
    debug!("Configuration: {:?}", config);

    let sequencer = match build_sequencer(&config) {
        Ok(sequencer) => sequencer,
        Err(e) => {
            output::print_failure_summary("invalid_config", None, &format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    match sequencer.run(RunContext::new(config)).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!();
            output::print_failure_summary(e.kind(), e.docs(), &e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Wire the production collaborators
fn build_sequencer(config: &RunConfig) -> Result<Sequencer> {
    let api = GiantSwarmClient::new(&config.endpoint, config.scheme, &config.token)
        .context("Failed to create API client")?;
    debug!("Using API at {}", api.base_url());
    let probe = HttpClient::new().context("Failed to create HTTP client")?;

    let load = BackgroundLoad::new(
        LoadConfig::new(String::new(), config.load_log_path())
            .duration(config.timings.load_duration)
            .report_interval(config.timings.load_report_interval),
    );

    Ok(Sequencer::new(
        Arc::new(api),
        Arc::new(SystemShell),
        Arc::new(probe),
        Arc::new(load),
    ))
}

fn print_report(report: &RunReport) {
    println!();
    output::print_success(&format!(
        "Acceptance test completed in {:.0?}",
        report.total
    ));
    if let Some(name) = &report.installation_name {
        output::print_info(&format!("Installation: {name}"));
    }
    if let Some(id) = &report.cluster_id {
        output::print_info(&format!("Cluster: {id}"));
    }
    if let Some(id) = &report.node_pool_id {
        output::print_info(&format!("Node pool: {id}"));
    }
    if let Some((desired, ready)) = report.node_counts {
        output::print_info(&format!("Nodes desired: {desired}, ready: {ready}"));
    }
    if let Some(url) = &report.test_app_url {
        output::print_info(&format!("Test app: {url}"));
    }
    for (step, duration) in &report.step_durations {
        output::print_info(&format!("{step}: {duration:.1?}"));
    }
    if let Some(path) = &report.kubeconfig_path {
        output::print_info(&format!("Kubeconfig: {}", path.display()));
    }
    if !report.is_clean() {
        output::complain(&format!(
            "{} check(s) failed without stopping the run:",
            report.findings.len()
        ));
        for finding in &report.findings {
            println!("  - {finding}");
        }
    }
}
