//! Environment variable configuration
//!
//! Provides environment variable overrides for run flags.

use std::env;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "API_ACCEPTANCE_TEST";

/// Configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// API endpoint from API_ACCEPTANCE_TEST_ENDPOINT
    pub endpoint: Option<String>,
    /// Auth scheme from API_ACCEPTANCE_TEST_SCHEME
    pub scheme: Option<String>,
    /// Auth token from API_ACCEPTANCE_TEST_TOKEN
    pub token: Option<String>,
    /// Owner organization from API_ACCEPTANCE_TEST_OWNER_ORG
    pub owner_org: Option<String>,
    /// Release version from API_ACCEPTANCE_TEST_RELEASE_VERSION
    pub release_version: Option<String>,
    /// Verbose logging from API_ACCEPTANCE_TEST_ENABLE_LOGGING
    pub enable_logging: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            endpoint: get_env("ENDPOINT"),
            scheme: get_env("SCHEME"),
            token: get_env("TOKEN"),
            owner_org: get_env("OWNER_ORG"),
            release_version: get_env("RELEASE_VERSION"),
            enable_logging: get_env_bool("ENABLE_LOGGING"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.endpoint.is_some()
            || self.scheme.is_some()
            || self.token.is_some()
            || self.owner_org.is_some()
            || self.release_version.is_some()
            || self.enable_logging.is_some()
    }

    /// Get scheme with fallback
    pub fn scheme_or(&self, default: &str) -> String {
        self.scheme.clone().unwrap_or_else(|| default.to_string())
    }

    /// Get owner organization with fallback
    pub fn owner_org_or(&self, default: &str) -> String {
        self.owner_org.clone().unwrap_or_else(|| default.to_string())
    }

    /// Get logging switch with fallback
    pub fn enable_logging_or(&self, default: bool) -> bool {
        self.enable_logging.unwrap_or(default)
    }
}

/// Get environment variable with prefix, ignoring empty values
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: String) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value));
        self
    }

    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        self.var("ENDPOINT", endpoint.into())
    }

    pub fn scheme(self, scheme: impl Into<String>) -> Self {
        self.var("SCHEME", scheme.into())
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        self.var("TOKEN", token.into())
    }

    pub fn owner_org(self, org: impl Into<String>) -> Self {
        self.var("OWNER_ORG", org.into())
    }

    pub fn release_version(self, version: impl Into<String>) -> Self {
        self.var("RELEASE_VERSION", version.into())
    }

    pub fn enable_logging(self, enabled: bool) -> Self {
        self.var("ENABLE_LOGGING", enabled.to_string())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all API_ACCEPTANCE_TEST environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_ENDPOINT         API endpoint URL");
    println!("  {ENV_PREFIX}_SCHEME           Auth scheme (giantswarm or Bearer)");
    println!("  {ENV_PREFIX}_TOKEN            Auth token");
    println!("  {ENV_PREFIX}_OWNER_ORG        Organization owning the test cluster");
    println!("  {ENV_PREFIX}_RELEASE_VERSION  Release version for the test cluster");
    println!("  {ENV_PREFIX}_ENABLE_LOGGING   Enable verbose output (true/false)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_ENDPOINT=https://api.g8s.example.com");
    println!("  export {ENV_PREFIX}_TOKEN=...");
    println!("  api-acceptance-test run");
}
