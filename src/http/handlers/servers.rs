//! Handlers for individual server records

use crate::core::model::ServerRecord;
use crate::core::publish::SubmitMode;
use crate::core::service::AdmissionRequest;
use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::{publish::authorization_header, AppState};
use crate::http::models::{ApiResponse, PublishRequest};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;
use validator::Validate;

fn parse_server_id(id: &str) -> HttpResult<String> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| HttpError::BadRequest(format!("Invalid server ID format: {}", id)))
}

/// GET /v0/servers/:id - Fetch a stored record
pub async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<Json<ApiResponse<ServerRecord>>> {
    let id = parse_server_id(&id)?;
    let record = state.service.store().get(&id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// PUT /v0/servers/:id - Update a stored record in place
pub async fn update_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> HttpResult<Json<ApiResponse<ServerRecord>>> {
    let id = parse_server_id(&id)?;
    request.validate()?;

    let stored = state
        .service
        .admit(AdmissionRequest {
            authorization: authorization_header(&headers),
            record: ServerRecord::from(request),
            mode: SubmitMode::Update(id),
        })
        .await?;

    Ok(Json(ApiResponse::success(stored)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_id() {
        assert!(parse_server_id("not-a-uuid").is_err());
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_server_id(&id).ok(), Some(id));
    }
}
