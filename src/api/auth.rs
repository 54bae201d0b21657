//! Authorization header construction

use std::fmt;
use std::str::FromStr;

use super::ApiError;

/// Auth scheme accepted by the API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    /// Regular API token
    GiantSwarm,
    /// SSO token
    Bearer,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::GiantSwarm => "giantswarm",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = ApiError;

    /// Case-sensitive: `giantswarm` or `Bearer`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "giantswarm" => Ok(AuthScheme::GiantSwarm),
            "Bearer" => Ok(AuthScheme::Bearer),
            other => Err(ApiError::InvalidConfig(format!(
                "scheme must be either 'Bearer' or 'giantswarm' (case sensitive), got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `Authorization` header: `"<scheme> <token>"`
pub fn auth_header(scheme: AuthScheme, token: &str) -> Result<String, ApiError> {
    if token.is_empty() {
        return Err(ApiError::InvalidConfig("invalid token provided".to_string()));
    }
    Ok(format!("{} {}", scheme.as_str(), token))
}
