//! HTTP error handling and conversion

use crate::core::service::ServiceError;
use crate::http::models::{ApiResponse, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;

/// HTTP error types
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Authentication errors
    Unauthorized(String),

    /// Validation errors
    BadRequest(String),
    ValidationError(HashMap<String, Vec<String>>),

    /// Not found errors
    NotFound(String),

    /// Conflict errors
    Conflict(String),

    /// Upstream provider errors
    BadGateway(String),

    /// Server errors
    InternalServerError(String),
}

impl HttpError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::BadRequest(_) | HttpError::ValidationError(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HttpError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::Unauthorized(_) => "UNAUTHORIZED",
            HttpError::BadRequest(_) => "BAD_REQUEST",
            HttpError::ValidationError(_) => "VALIDATION_ERROR",
            HttpError::NotFound(_) => "NOT_FOUND",
            HttpError::Conflict(_) => "CONFLICT",
            HttpError::BadGateway(_) => "UPSTREAM_ERROR",
            HttpError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            HttpError::ValidationError(errors) => {
                write!(f, "Validation Error: {:?}", errors)
            }
            HttpError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            HttpError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            HttpError::BadGateway(msg) => write!(f, "Bad Gateway: {}", msg),
            HttpError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let (message, details) = match self {
            HttpError::ValidationError(errors) => {
                ("Validation failed".to_string(), Some(json!(errors)))
            }
            HttpError::Unauthorized(msg)
            | HttpError::BadRequest(msg)
            | HttpError::NotFound(msg)
            | HttpError::Conflict(msg)
            | HttpError::BadGateway(msg)
            | HttpError::InternalServerError(msg) => (msg, None),
        };

        let body = ApiResponse::<()>::error(ErrorResponse {
            code: error_code.to_string(),
            message,
            details,
        });

        (status, Json(body)).into_response()
    }
}

/// Convert service errors to HTTP errors
impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::AuthenticationRequired(_) | ServiceError::InvalidCredentials(_) => {
                HttpError::Unauthorized(message)
            }
            ServiceError::DuplicateVersion(_) => HttpError::Conflict(message),
            ServiceError::VersionRegression(_)
            | ServiceError::InvalidInput(_)
            | ServiceError::InvalidCredentialUse(_)
            | ServiceError::UnsupportedMethod(_) => HttpError::BadRequest(message),
            ServiceError::NotFound(_) => HttpError::NotFound(message),
            ServiceError::ProviderUnavailable(_) => HttpError::BadGateway(message),
            ServiceError::Config(_) | ServiceError::Storage(_) => {
                HttpError::InternalServerError(message)
            }
        }
    }
}

/// Flatten request validation failures into per-field messages.
///
/// Nested struct fields are keyed by their dotted path.
impl From<validator::ValidationErrors> for HttpError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = HashMap::new();
        collect_validation_errors("", &errors, &mut fields);
        HttpError::ValidationError(fields)
    }
}

fn collect_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut HashMap<String, Vec<String>>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.entry(path).or_default().extend(list.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

/// Result type alias for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;
