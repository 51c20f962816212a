//! Core admission modules

pub mod auth;
pub mod model;
pub mod publish;
pub mod service;
pub mod store;
pub mod version;

// Re-export main types for convenience
pub use auth::{
    extract_token, resolve_auth_method, AuthFlowStart, AuthMethod, AuthService, AuthStatus,
    Credential, DeviceAuthorizationSession, GitHubDeviceAuth, GitHubOAuthConfig, SessionState,
};
pub use model::{Repository, ServerRecord, ServerStatus, VersionDetail};
pub use publish::{PublishController, SubmitMode};
pub use service::{
    AdmissionRequest, AdmissionService, HttpServerConfig, ServiceConfig, ServiceError,
};
pub use store::{InMemoryStore, RegistryStore};
pub use version::{compare_versions, is_newer, normalize_version, VersionError};
