//! Admission service: configuration, error taxonomy and the write pipeline

use crate::core::auth::{AuthService, Credential, GitHubDeviceAuth, GitHubOAuthConfig};
use crate::core::model::ServerRecord;
use crate::core::publish::{PublishController, SubmitMode};
use crate::core::store::RegistryStore;
use crate::core::version::VersionError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,

    /// Origins allowed for CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// GitHub OAuth application used for device login and token checks
    pub github: GitHubOAuthConfig,

    /// Upper bound on any single call to the OAuth provider (seconds)
    pub provider_timeout_secs: u64,

    /// HTTP server configuration
    pub http: HttpServerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            github: GitHubOAuthConfig::default(),
            provider_timeout_secs: 10,
            http: HttpServerConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }
}

/// Errors surfaced by the admission core.
///
/// Only [`ServiceError::ProviderUnavailable`] is worth retrying; every other
/// kind is a definitive answer for the request.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credential use: {0}")]
    InvalidCredentialUse(String),

    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Unsupported auth method: {0}")]
    UnsupportedMethod(String),

    #[error("Duplicate version: {0}")]
    DuplicateVersion(String),

    #[error("Version regression: {0}")]
    VersionRegression(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Whether the caller may retry the request with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::ProviderUnavailable(_))
    }
}

impl From<VersionError> for ServiceError {
    fn from(err: VersionError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// A write as handed over by the HTTP layer
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Raw `Authorization` header value, empty when absent
    pub authorization: String,
    pub record: ServerRecord,
    pub mode: SubmitMode,
}

/// Admission control for registry writes.
///
/// Runs credential extraction, method resolution and validation, then hands
/// the record to the [`PublishController`].
pub struct AdmissionService {
    config: ServiceConfig,
    auth: AuthService,
    publisher: PublishController,
}

impl AdmissionService {
    /// Create a service over `store`, talking to GitHub as configured
    pub fn new(config: ServiceConfig, store: Arc<dyn RegistryStore>) -> Result<Self, ServiceError> {
        let github = GitHubDeviceAuth::new(config.github.clone(), config.provider_timeout())?;
        info!(
            "Admission service using GitHub API at {}",
            config.github.api_base_url
        );
        Ok(Self {
            auth: AuthService::new(github),
            publisher: PublishController::new(store),
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn publisher(&self) -> &PublishController {
        &self.publisher
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        self.publisher.store()
    }

    /// Authenticate a write and, when allowed, apply it to the store
    pub async fn admit(&self, request: AdmissionRequest) -> Result<ServerRecord, ServiceError> {
        let AdmissionRequest {
            authorization,
            record,
            mode,
        } = request;

        if record.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Name is required".to_string()));
        }
        if record.version().trim().is_empty() {
            return Err(ServiceError::InvalidInput("Version is required".to_string()));
        }

        let credential = Credential::for_resource(&record.name, &authorization);
        let valid = self.auth.validate_auth(&credential).await?;
        if !valid {
            warn!(
                "Rejected {} credentials for '{}'",
                credential.method, record.name
            );
            return Err(ServiceError::InvalidCredentials(format!(
                "Credentials do not grant access to '{}'",
                record.name
            )));
        }

        self.publisher.submit(record, mode).await
    }
}
