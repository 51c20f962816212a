//! # Registry Admission
//!
//! Write-path admission control for a namespaced server registry.
//!
//! ## Architecture
//!
//! The crate provides:
//! - Credential extraction and namespace-driven auth method resolution
//! - The GitHub OAuth device-authorization flow for interactive login
//! - Token validation against the repository a namespace maps to
//! - Version-ordered publish and update of registry records
//! - An HTTP front end and a CLI over the same service
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use registry_admission::{
//!     AdmissionRequest, AdmissionService, InMemoryStore, ServerRecord, ServiceConfig, SubmitMode,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = AdmissionService::new(ServiceConfig::default(), Arc::new(InMemoryStore::new()))?;
//!
//!     let stored = service
//!         .admit(AdmissionRequest {
//!             authorization: String::new(),
//!             record: ServerRecord::new("com.example/tool", "1.0.0"),
//!             mode: SubmitMode::Create,
//!         })
//!         .await?;
//!     println!("Published as {}", stored.id);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod http;

pub use core::auth::{
    extract_token, resolve_auth_method, AuthFlowStart, AuthMethod, AuthService, AuthStatus,
    Credential, DeviceAuthorizationSession, GitHubDeviceAuth, GitHubOAuthConfig, RepoRef,
    SessionState, GITHUB_NAMESPACE_PREFIX,
};
pub use core::model::{Repository, ServerRecord, ServerStatus, VersionDetail};
pub use core::publish::{PublishController, SubmitMode};
pub use core::service::{
    AdmissionRequest, AdmissionService, HttpServerConfig, ServiceConfig, ServiceError,
};
pub use core::store::{InMemoryStore, RegistryStore};

// Re-export commonly used types
pub use async_trait::async_trait;
pub use std::sync::Arc;

/// Version of the admission service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the service (safe for testing)
pub fn init_logging() {
    // Only initialize logging once
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "registry_admission=info".into());

        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

        // This will fail silently if already initialized
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
