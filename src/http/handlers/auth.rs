//! Interactive login endpoint handlers

use crate::core::auth::{AuthMethod, AuthStatus};
use crate::core::service::ServiceError;
use crate::http::errors::HttpResult;
use crate::http::handlers::AppState;
use crate::http::models::{ApiResponse, AuthStatusResponse, StartAuthRequest, StartAuthResponse};
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use validator::Validate;

/// POST /v0/auth/device - Start a device-authorization login
pub async fn start_login(
    State(state): State<AppState>,
    Json(request): Json<StartAuthRequest>,
) -> HttpResult<Json<ApiResponse<StartAuthResponse>>> {
    request.validate()?;

    let method: AuthMethod = request
        .method
        .parse()
        .map_err(ServiceError::UnsupportedMethod)?;

    let started = state
        .service
        .auth()
        .start_auth_flow(method, &request.scope)
        .await?;
    info!("Started {} login session", method);

    Ok(Json(ApiResponse::success(StartAuthResponse {
        session_handle: started.session_handle,
        instructions: started.instructions,
    })))
}

/// GET /v0/auth/device/:handle - Check a login once
pub async fn login_status(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> HttpResult<Json<ApiResponse<AuthStatusResponse>>> {
    let status = state.service.auth().check_auth_status(&handle).await?;

    let response = match status {
        AuthStatus::Pending { interval_secs } => AuthStatusResponse {
            status: status.as_str().to_string(),
            interval: Some(interval_secs),
            access_token: None,
        },
        AuthStatus::Authorized { ref access_token } => AuthStatusResponse {
            status: status.as_str().to_string(),
            interval: None,
            access_token: Some(access_token.clone()),
        },
        AuthStatus::Denied | AuthStatus::Expired => AuthStatusResponse {
            status: status.as_str().to_string(),
            interval: None,
            access_token: None,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}
