//! GitHub OAuth device-authorization flow and repository access checks

use crate::core::auth::session::{
    AuthStatus, DeviceAuthorizationSession, SessionState, SessionTable,
};
use crate::core::auth::GITHUB_NAMESPACE_PREFIX;
use crate::core::service::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

// GitHub logins: alphanumerics and single hyphens, at most 39 chars.
// Repository names: alphanumerics, '-', '_' and '.', at most 100 chars.
#[allow(clippy::expect_used)]
static REPO_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9-]{0,38})/([A-Za-z0-9._-]{1,100})$")
        .expect("repository reference pattern is valid")
});

/// GitHub OAuth application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    /// Enables token introspection through the OAuth application API
    pub client_secret: Option<String>,
    pub api_base_url: String,
    pub login_base_url: String,
    pub default_scope: String,
}

impl Default for GitHubOAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            api_base_url: "https://api.github.com".to_string(),
            login_base_url: "https://github.com".to_string(),
            default_scope: "read:user".to_string(),
        }
    }
}

impl GitHubOAuthConfig {
    /// Check that both base URLs are absolute http(s) URLs
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("login_base_url", &self.login_base_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                ServiceError::Config(format!("Invalid github.{} '{}': {}", field, value, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ServiceError::Config(format!(
                    "github.{} must use http or https, got '{}'",
                    field,
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    fn login_url(&self, path: &str) -> String {
        format!("{}{}", self.login_base_url.trim_end_matches('/'), path)
    }

    fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// Owner/repository pair a resource name is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `io.github.owner/repo` or a bare `owner/repo`
    pub fn parse(reference: &str) -> Result<Self, ServiceError> {
        let bare = reference
            .strip_prefix(GITHUB_NAMESPACE_PREFIX)
            .unwrap_or(reference);

        let captures = REPO_REF_PATTERN.captures(bare).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "Repository reference '{}' is not of the form owner/repository",
                reference
            ))
        })?;

        let owner = captures[1].to_string();
        let repo = captures[2].to_string();
        if owner.ends_with('-') || owner.contains("--") || repo == "." || repo == ".." {
            return Err(ServiceError::InvalidInput(format!(
                "Repository reference '{}' names an invalid owner or repository",
                reference
            )));
        }

        Ok(Self { owner, repo })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Outcome of starting a device flow: what to show the user, and the handle
/// to poll with
#[derive(Debug, Clone, Serialize)]
pub struct AuthFlowStart {
    pub instructions: HashMap<String, String>,
    pub session_handle: String,
}

/// Device code response from GitHub
#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_uri: Option<String>,
    expires_in: Option<u64>,
    interval: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Access token response from GitHub
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    interval: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RepoPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    push: bool,
    #[serde(default)]
    pull: bool,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    permissions: Option<RepoPermissions>,
}

/// GitHub device-authorization client.
///
/// Each call is a single request to GitHub; polling cadence belongs to the
/// caller.
pub struct GitHubDeviceAuth {
    config: GitHubOAuthConfig,
    client: Client,
    sessions: SessionTable,
}

impl GitHubDeviceAuth {
    /// Create a client whose provider calls give up after `timeout`
    pub fn new(config: GitHubOAuthConfig, timeout: Duration) -> Result<Self, ServiceError> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(concat!("registry-admission/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            sessions: SessionTable::new(),
        })
    }

    pub fn config(&self) -> &GitHubOAuthConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Request a device/user code pair and open a session for it
    pub async fn start_device_flow(&self, scope: &str) -> Result<AuthFlowStart, ServiceError> {
        if self.config.client_id.is_empty() {
            return Err(ServiceError::Config(
                "GitHub client_id is not configured".to_string(),
            ));
        }

        let purged = self.sessions.purge_expired().await;
        if purged > 0 {
            debug!("Dropped {} expired device sessions", purged);
        }

        let scope = if scope.trim().is_empty() {
            self.config.default_scope.as_str()
        } else {
            scope.trim()
        };
        let params = [("client_id", self.config.client_id.as_str()), ("scope", scope)];

        let response = self
            .client
            .post(self.config.login_url("/login/device/code"))
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_error("Device code request", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error("Device code request", status, &text));
        }

        let body: DeviceCodeResponse = response
            .json()
            .await
            .map_err(|e| provider_error("Device code response", e))?;

        if let Some(error) = body.error {
            return Err(ServiceError::Config(format!(
                "GitHub rejected the device code request: {} {}",
                error,
                body.error_description.unwrap_or_default()
            )));
        }

        let (Some(device_code), Some(user_code), Some(verification_uri), Some(expires_in)) = (
            body.device_code,
            body.user_code,
            body.verification_uri,
            body.expires_in,
        ) else {
            return Err(ServiceError::ProviderUnavailable(
                "Device code response is missing required fields".to_string(),
            ));
        };
        let interval = body.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let mut instructions = HashMap::new();
        instructions.insert("verification_uri".to_string(), verification_uri.clone());
        instructions.insert("user_code".to_string(), user_code.clone());
        instructions.insert("expires_in".to_string(), expires_in.to_string());
        instructions.insert("interval".to_string(), interval.to_string());

        let session_handle = Uuid::new_v4().to_string();
        let session = DeviceAuthorizationSession::new(
            device_code,
            user_code,
            verification_uri,
            expires_in,
            interval,
        );
        self.sessions.insert(session_handle.clone(), session).await;

        info!(
            "Started GitHub device flow {} (scope '{}', expires in {}s)",
            session_handle, scope, expires_in
        );

        Ok(AuthFlowStart {
            instructions,
            session_handle,
        })
    }

    /// Poll GitHub once for the state of a session.
    ///
    /// Unknown handles (never issued, or already finished) are `NotFound`.
    /// Expired sessions report `Expired` without contacting GitHub.
    pub async fn check_status(&self, session_handle: &str) -> Result<AuthStatus, ServiceError> {
        let session = self.sessions.get(session_handle).await.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Device authorization session '{}' not found",
                session_handle
            ))
        })?;

        if session.is_expired() {
            self.sessions
                .complete(session_handle, SessionState::Expired)
                .await;
            debug!("Device session {} expired", session_handle);
            return Ok(AuthStatus::Expired);
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("device_code", session.device_code.as_str()),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];

        let response = self
            .client
            .post(self.config.login_url("/login/oauth/access_token"))
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_error("Access token poll", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error("Access token poll", status, &text));
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| provider_error("Access token response", e))?;

        let outcome = match (body.access_token, body.error.as_deref()) {
            (Some(access_token), _) if !access_token.is_empty() => {
                self.sessions
                    .complete(session_handle, SessionState::Authorized)
                    .await;
                AuthStatus::Authorized { access_token }
            }
            (_, Some("authorization_pending")) => AuthStatus::Pending {
                interval_secs: session.poll_interval_secs,
            },
            (_, Some("slow_down")) => {
                let interval_secs = body
                    .interval
                    .unwrap_or(session.poll_interval_secs + SLOW_DOWN_INCREMENT_SECS);
                self.sessions
                    .set_interval(session_handle, interval_secs)
                    .await;
                AuthStatus::Pending { interval_secs }
            }
            (_, Some("access_denied")) => {
                self.sessions
                    .complete(session_handle, SessionState::Denied)
                    .await;
                AuthStatus::Denied
            }
            (_, Some("expired_token" | "token_expired" | "incorrect_device_code")) => {
                self.sessions
                    .complete(session_handle, SessionState::Expired)
                    .await;
                AuthStatus::Expired
            }
            (_, Some(other)) => {
                warn!(
                    "GitHub rejected device session {}: {}",
                    session_handle, other
                );
                return Err(ServiceError::Config(format!(
                    "GitHub rejected the token request: {} {}",
                    other,
                    body.error_description.unwrap_or_default()
                )));
            }
            (_, None) => {
                return Err(ServiceError::ProviderUnavailable(
                    "Access token response carried neither a token nor an error".to_string(),
                ))
            }
        };

        debug!("Device session {} is {}", session_handle, outcome);
        Ok(outcome)
    }

    /// Check that `token` is live and can read the repository named by
    /// `repo_ref`.
    ///
    /// Returns `Ok(false)` for tokens GitHub refuses and for repositories
    /// the token cannot see; transport faults are `ProviderUnavailable`.
    pub async fn validate_token(&self, token: &str, repo_ref: &str) -> Result<bool, ServiceError> {
        if token.is_empty() {
            return Ok(false);
        }
        let repo = RepoRef::parse(repo_ref)?;

        if !self.token_is_active(token).await? {
            debug!("GitHub token rejected while validating access to {}", repo);
            return Ok(false);
        }

        let readable = self.can_read_repository(token, &repo).await?;
        if !readable {
            debug!("GitHub token has no read access to {}", repo);
        }
        Ok(readable)
    }

    async fn token_is_active(&self, token: &str) -> Result<bool, ServiceError> {
        let response = match self.config.client_secret() {
            Some(secret) => self
                .client
                .post(
                    self.config
                        .api_url(&format!("/applications/{}/token", self.config.client_id)),
                )
                .basic_auth(&self.config.client_id, Some(secret))
                .header("Accept", GITHUB_ACCEPT)
                .json(&serde_json::json!({ "access_token": token }))
                .send()
                .await
                .map_err(|e| provider_error("Token introspection", e))?,
            None => self
                .client
                .get(self.config.api_url("/user"))
                .bearer_auth(token)
                .header("Accept", GITHUB_ACCEPT)
                .send()
                .await
                .map_err(|e| provider_error("Token introspection", e))?,
        };

        match response.status() {
            s if s.is_success() => Ok(true),
            _ if is_rate_limited(&response) => Err(rate_limit_error("Token introspection")),
            StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::UNPROCESSABLE_ENTITY => Ok(false),
            s => {
                let text = response.text().await.unwrap_or_default();
                Err(status_error("Token introspection", s, &text))
            }
        }
    }

    async fn can_read_repository(&self, token: &str, repo: &RepoRef) -> Result<bool, ServiceError> {
        let response = self
            .client
            .get(
                self.config
                    .api_url(&format!("/repos/{}/{}", repo.owner, repo.repo)),
            )
            .bearer_auth(token)
            .header("Accept", GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| provider_error("Repository access check", e))?;

        match response.status() {
            _ if is_rate_limited(&response) => Err(rate_limit_error("Repository access check")),
            s if s.is_success() => {
                let body: RepoResponse = response
                    .json()
                    .await
                    .map_err(|e| provider_error("Repository response", e))?;
                Ok(body
                    .permissions
                    .map_or(true, |p| p.pull || p.push || p.admin))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(false),
            s => {
                let text = response.text().await.unwrap_or_default();
                Err(status_error("Repository access check", s, &text))
            }
        }
    }
}

fn provider_error(context: &str, err: reqwest::Error) -> ServiceError {
    warn!("{} failed: {}", context, err);
    if err.is_timeout() {
        ServiceError::ProviderUnavailable(format!("{} timed out", context))
    } else {
        ServiceError::ProviderUnavailable(format!("{} failed: {}", context, err))
    }
}

/// GitHub signals rate limiting with 403 or 429 plus either an exhausted
/// `x-ratelimit-remaining` or a `retry-after` header.
fn is_rate_limited(response: &reqwest::Response) -> bool {
    let status = response.status();
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return false;
    }
    let headers = response.headers();
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    exhausted || headers.contains_key(reqwest::header::RETRY_AFTER)
}

fn rate_limit_error(context: &str) -> ServiceError {
    warn!("{} hit the GitHub rate limit", context);
    ServiceError::ProviderUnavailable(format!("{} was rate limited by GitHub", context))
}

fn status_error(context: &str, status: StatusCode, body: &str) -> ServiceError {
    warn!("{} returned HTTP {}: {}", context, status, body);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ServiceError::ProviderUnavailable(format!("{} failed: HTTP {}", context, status))
    } else {
        ServiceError::Config(format!("{} rejected: HTTP {}", context, status))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_parse() {
        let r = RepoRef::parse("io.github.acme/tool").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "tool");
        assert_eq!(r.to_string(), "acme/tool");

        let r = RepoRef::parse("octo-org/my.repo_name").unwrap();
        assert_eq!(r.owner, "octo-org");
        assert_eq!(r.repo, "my.repo_name");
    }

    #[test]
    fn test_repo_ref_rejects_malformed() {
        for bad in [
            "",
            "io.github.acme",
            "io.github.acme/",
            "io.github./tool",
            "acme/tool/extra",
            "acme/..",
            "-acme/tool",
            "acme-/tool",
            "ac--me/tool",
            "acme/to ol",
        ] {
            assert!(
                matches!(RepoRef::parse(bad), Err(ServiceError::InvalidInput(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_config_validate() {
        assert!(GitHubOAuthConfig::default().validate().is_ok());

        let bad = GitHubOAuthConfig {
            api_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ServiceError::Config(_))));

        let ftp = GitHubOAuthConfig {
            login_base_url: "ftp://github.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(ftp.validate(), Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_urls_join_without_double_slash() {
        let config = GitHubOAuthConfig {
            api_base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_url("/user"), "http://localhost:9000/user");
    }

    #[tokio::test]
    async fn test_empty_token_is_invalid_without_provider_call() {
        // Unroutable base URL: any request would fail with ProviderUnavailable
        let config = GitHubOAuthConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let auth = GitHubDeviceAuth::new(config, Duration::from_secs(1)).unwrap();
        assert!(!auth.validate_token("", "io.github.acme/tool").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_repo_ref_fails_without_provider_call() {
        let config = GitHubOAuthConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let auth = GitHubDeviceAuth::new(config, Duration::from_secs(1)).unwrap();
        let result = auth.validate_token("gho_token", "io.github.acme").await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_start_flow_requires_client_id() {
        let auth =
            GitHubDeviceAuth::new(GitHubOAuthConfig::default(), Duration::from_secs(1)).unwrap();
        let result = auth.start_device_flow("").await;
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let auth =
            GitHubDeviceAuth::new(GitHubOAuthConfig::default(), Duration::from_secs(1)).unwrap();
        let result = auth.check_status("no-such-handle").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
