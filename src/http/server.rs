//! Axum HTTP server implementation

use crate::core::service::{AdmissionService, ServiceError};
use crate::http::handlers::{auth, publish, servers, status, AppState};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the API router over `state`
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.service.config().http.allowed_origins);

    Router::new()
        .route("/v0/publish", post(publish::publish))
        .route(
            "/v0/servers/:id",
            get(servers::get_server).put(servers::update_server),
        )
        .route("/v0/auth/device", post(auth::start_login))
        .route("/v0/auth/device/:handle", get(auth::login_status))
        .route("/v0/health", get(status::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Registry admission HTTP server
pub struct RegistryServer {
    service: Arc<AdmissionService>,
    addr: SocketAddr,
}

impl RegistryServer {
    /// Create a new server instance
    pub fn new(service: Arc<AdmissionService>, host: &str, port: u16) -> Result<Self, ServiceError> {
        let addr = Self::parse_address(host, port).map_err(ServiceError::Config)?;
        Ok(Self { service, addr })
    }

    /// Parse and normalize host:port into a SocketAddr
    fn parse_address(host: &str, port: u16) -> Result<SocketAddr, String> {
        let normalized_host = Self::normalize_host(host);

        // IPv6 addresses need brackets
        let addr_str = if normalized_host.contains(':') {
            format!("[{}]:{}", normalized_host, port)
        } else {
            format!("{}:{}", normalized_host, port)
        };

        addr_str.parse().map_err(|_| {
            format!(
                "Unable to parse address '{}'. Use IP addresses like '127.0.0.1', '0.0.0.0' or '::1'",
                addr_str
            )
        })
    }

    /// Normalize hostnames for SocketAddr compatibility
    fn normalize_host(host: &str) -> String {
        match host {
            "localhost" => "127.0.0.1".to_string(),
            "::1" | "[::1]" => "::1".to_string(),
            "::" | "[::]" => "::".to_string(),
            _ => host.to_string(),
        }
    }

    /// Start the server and run until ctrl-c
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(AppState::new(self.service.clone()));

        info!("Starting registry admission server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let actual_addr = listener.local_addr()?;
        info!("Server bound to {}", actual_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// Get server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
