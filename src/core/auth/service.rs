//! Credential validation dispatched over the authentication method

use crate::core::auth::github::{AuthFlowStart, GitHubDeviceAuth};
use crate::core::auth::session::AuthStatus;
use crate::core::auth::{AuthMethod, Credential};
use crate::core::service::ServiceError;
use tracing::{debug, warn};

/// Authentication service for registry writes.
///
/// Every method must handle all four combinations of method and token
/// presence in [`AuthService::validate_auth`]:
///
/// | method | token  | outcome                                   |
/// |--------|--------|-------------------------------------------|
/// | None   | empty  | `Ok(true)`                                |
/// | None   | given  | `Err(InvalidCredentialUse)`               |
/// | GitHub | empty  | `Err(AuthenticationRequired)`             |
/// | GitHub | given  | result of [`GitHubDeviceAuth::validate_token`] |
pub struct AuthService {
    github: GitHubDeviceAuth,
}

impl AuthService {
    pub fn new(github: GitHubDeviceAuth) -> Self {
        Self { github }
    }

    pub fn github(&self) -> &GitHubDeviceAuth {
        &self.github
    }

    /// Validate a credential against the method its resource requires
    pub async fn validate_auth(&self, credential: &Credential) -> Result<bool, ServiceError> {
        let has_token = !credential.token.is_empty();

        match (credential.method, has_token) {
            (AuthMethod::None, false) => Ok(true),
            (AuthMethod::None, true) => {
                warn!(
                    "Rejected token supplied for '{}', which requires no authentication",
                    credential.repo_ref
                );
                Err(ServiceError::InvalidCredentialUse(format!(
                    "A token was provided but '{}' requires no authentication",
                    credential.repo_ref
                )))
            }
            (AuthMethod::GitHub, false) => Err(ServiceError::AuthenticationRequired(format!(
                "Authentication is required for '{}'",
                credential.repo_ref
            ))),
            (AuthMethod::GitHub, true) => {
                let valid = self
                    .github
                    .validate_token(&credential.token, &credential.repo_ref)
                    .await?;
                debug!(
                    "GitHub token for '{}' validated: {}",
                    credential.repo_ref, valid
                );
                Ok(valid)
            }
        }
    }

    /// Begin an interactive login for `method`
    pub async fn start_auth_flow(
        &self,
        method: AuthMethod,
        scope: &str,
    ) -> Result<AuthFlowStart, ServiceError> {
        match method {
            AuthMethod::GitHub => self.github.start_device_flow(scope).await,
            AuthMethod::None => Err(ServiceError::UnsupportedMethod(format!(
                "Auth method '{}' has no login flow",
                method
            ))),
        }
    }

    /// Poll a login started with [`AuthService::start_auth_flow`] once
    pub async fn check_auth_status(&self, session_handle: &str) -> Result<AuthStatus, ServiceError> {
        self.github.check_status(session_handle).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::auth::GitHubOAuthConfig;
    use std::time::Duration;

    fn service() -> AuthService {
        // Requests to this address fail fast; the table rows below never reach it
        let config = GitHubOAuthConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            login_base_url: "http://127.0.0.1:9".to_string(),
            client_id: "client".to_string(),
            ..Default::default()
        };
        AuthService::new(GitHubDeviceAuth::new(config, Duration::from_secs(1)).unwrap())
    }

    fn credential(method: AuthMethod, token: &str) -> Credential {
        Credential {
            method,
            token: token.to_string(),
            repo_ref: "io.github.acme/tool".to_string(),
        }
    }

    #[tokio::test]
    async fn test_none_without_token_is_valid() {
        let valid = service()
            .validate_auth(&credential(AuthMethod::None, ""))
            .await
            .unwrap();
        assert!(valid);
    }

    #[tokio::test]
    async fn test_none_with_token_is_rejected() {
        let result = service()
            .validate_auth(&credential(AuthMethod::None, "abc"))
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidCredentialUse(_))
        ));
    }

    #[tokio::test]
    async fn test_github_without_token_requires_auth() {
        let result = service()
            .validate_auth(&credential(AuthMethod::GitHub, ""))
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::AuthenticationRequired(_))
        ));
    }

    #[tokio::test]
    async fn test_github_with_token_surfaces_provider_outage() {
        let result = service()
            .validate_auth(&credential(AuthMethod::GitHub, "gho_abc"))
            .await;
        assert!(matches!(result, Err(ServiceError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_start_flow_rejects_method_without_flow() {
        let result = service().start_auth_flow(AuthMethod::None, "").await;
        assert!(matches!(result, Err(ServiceError::UnsupportedMethod(_))));
    }

    #[tokio::test]
    async fn test_start_flow_surfaces_provider_outage() {
        let result = service().start_auth_flow(AuthMethod::GitHub, "").await;
        assert!(matches!(result, Err(ServiceError::ProviderUnavailable(_))));
    }
}
