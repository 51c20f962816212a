//! Health endpoint and shared handler state

use crate::core::service::AdmissionService;
use crate::http::errors::HttpResult;
use crate::http::models::{ApiResponse, HealthResponse};
use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::SystemTime;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdmissionService>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(service: Arc<AdmissionService>) -> Self {
        Self {
            service,
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs()
    }
}

/// GET /v0/health - Liveness check
pub async fn health(State(state): State<AppState>) -> HttpResult<Json<ApiResponse<HealthResponse>>> {
    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })))
}
