//! Request and response models for the HTTP API

use crate::core::model::{Repository, ServerRecord, ServerStatus, VersionDetail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Generic API response wrapper
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Body of a publish or update request
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct PublishRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 4096, message = "Description must be at most 4096 characters"))]
    pub description: String,

    #[serde(default)]
    pub status: ServerStatus,

    #[serde(default)]
    pub repository: Repository,

    #[validate(nested)]
    pub version_detail: VersionDetailRequest,
}

/// Version part of a publish request
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct VersionDetailRequest {
    #[validate(length(max = 64, message = "Version must be at most 64 characters"))]
    pub version: String,
}

impl From<PublishRequest> for ServerRecord {
    fn from(request: PublishRequest) -> Self {
        ServerRecord {
            id: String::new(),
            name: request.name,
            description: request.description,
            status: request.status,
            repository: request.repository,
            version_detail: VersionDetail {
                version: request.version_detail.version,
                release_date: None,
                is_latest: false,
            },
        }
    }
}

/// Request to start an interactive login
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct StartAuthRequest {
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    #[validate(length(max = 256, message = "Scope must be at most 256 characters"))]
    pub scope: String,
}

fn default_method() -> String {
    "github".to_string()
}

/// Response to a started login
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StartAuthResponse {
    pub session_handle: String,
    pub instructions: HashMap<String, String>,
}

/// Response to a login status poll
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Health response
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
