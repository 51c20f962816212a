//! Publish endpoint handler

use crate::core::model::ServerRecord;
use crate::core::publish::SubmitMode;
use crate::core::service::AdmissionRequest;
use crate::http::errors::HttpResult;
use crate::http::handlers::AppState;
use crate::http::models::{ApiResponse, PublishRequest};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

/// Raw `Authorization` header value, empty when missing or not valid UTF-8
pub(crate) fn authorization_header(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// POST /v0/publish - Publish a new server version
pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> HttpResult<(StatusCode, Json<ApiResponse<ServerRecord>>)> {
    request.validate()?;

    let stored = state
        .service
        .admit(AdmissionRequest {
            authorization: authorization_header(&headers),
            record: ServerRecord::from(request),
            mode: SubmitMode::Create,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}
