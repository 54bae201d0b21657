//! Names, domains and the test app manifest

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::path::Path;

use super::UatError;

const CLUSTER_NAME_PREFIX: &str = "api-acceptance-testing";

/// Placeholder replaced in the manifest template
pub const BASE_DOMAIN_PLACEHOLDER: &str = "CLUSTER_BASE_DOMAIN";

/// Deployment created by the test app manifest
pub const TEST_APP_DEPLOYMENT: &str = "deployment/e2e-app";

/// Replica count the test app is scaled to once load is running
pub const TEST_APP_REPLICAS: u32 = 5;

/// Five random lowercase alphanumerics
pub fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// `api-acceptance-testing [v<release> ]<YYYY-MM-DD HH:MM:SS UTC> <suffix>`
pub fn cluster_name(release_version: Option<&str>, now: DateTime<Utc>, suffix: &str) -> String {
    let mut name = format!("{CLUSTER_NAME_PREFIX} ");
    if let Some(version) = release_version {
        name.push_str(&format!("v{version} "));
    }
    name.push_str(&now.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    name.push(' ');
    name.push_str(suffix);
    name
}

/// Base domain of a cluster: its API endpoint without `https://api.`
pub fn base_domain(api_endpoint: &str) -> String {
    let endpoint = api_endpoint.trim_end_matches('/');
    endpoint
        .strip_prefix("https://api.")
        .unwrap_or(endpoint)
        .to_string()
}

pub fn test_app_url(base_domain: &str) -> String {
    format!("http://test.{base_domain}/delay/1")
}

/// Fill in the base domain and write the result to `output`
pub fn render_manifest(template: &Path, output: &Path, base_domain: &str) -> Result<(), UatError> {
    let content = std::fs::read_to_string(template).map_err(|source| UatError::Io {
        context: format!("failed to read manifest template {}", template.display()),
        source,
    })?;

    let rendered = content.replace(BASE_DOMAIN_PLACEHOLDER, base_domain);

    std::fs::write(output, rendered).map_err(|source| UatError::Io {
        context: format!("failed to write manifest {}", output.display()),
        source,
    })
}
