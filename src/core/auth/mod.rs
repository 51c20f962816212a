//! Authentication for registry writes
//!
//! A write passes through three steps before it reaches the publish
//! controller:
//! - the raw credential carrier is reduced to a token ([`extract_token`])
//! - the record name determines which [`AuthMethod`] applies
//!   ([`resolve_auth_method`])
//! - [`AuthService::validate_auth`] checks the token against that method,
//!   calling out to GitHub for `io.github.*` names

pub mod github;
pub mod service;
pub mod session;

pub use github::{AuthFlowStart, GitHubDeviceAuth, GitHubOAuthConfig, RepoRef};
pub use service::AuthService;
pub use session::{AuthStatus, DeviceAuthorizationSession, SessionState, SessionTable};

use serde::{Deserialize, Serialize};

/// Namespace prefix whose names are owned by GitHub repositories
pub const GITHUB_NAMESPACE_PREFIX: &str = "io.github.";

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication method required for a resource namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    None,
    GitHub,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::GitHub => "github",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(AuthMethod::None),
            "github" => Ok(AuthMethod::GitHub),
            other => Err(format!("Unknown auth method '{}'", other)),
        }
    }
}

/// Credential presented with a single write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub method: AuthMethod,
    pub token: String,
    /// Declared name of the resource, used to scope repository checks
    pub repo_ref: String,
}

impl Credential {
    /// Build the credential for a write to `name` carrying `raw` in its
    /// authorization header
    pub fn for_resource(name: &str, raw: &str) -> Self {
        Self {
            method: resolve_auth_method(name),
            token: extract_token(raw),
            repo_ref: name.to_string(),
        }
    }
}

/// Map a resource name to the authentication method its namespace requires
pub fn resolve_auth_method(name: &str) -> AuthMethod {
    if name.starts_with(GITHUB_NAMESPACE_PREFIX) {
        AuthMethod::GitHub
    } else {
        AuthMethod::None
    }
}

/// Reduce a raw authorization header value to a bare token.
///
/// A leading `Bearer ` (any case) is stripped; anything else is taken
/// verbatim. An empty value yields an empty token.
pub fn extract_token(raw: &str) -> String {
    match raw.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            raw[BEARER_PREFIX.len()..].to_string()
        }
        _ => raw.to_string(),
    }
}
