//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed identity, unreadable body or forbidden association.
    #[error("{0}")]
    BadRequest(String),
    /// Request fields failed validation.
    #[error("Validation failed")]
    Validation(Vec<String>),
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// The request conflicts with an existing resource.
    #[error("{0}")]
    Conflict(String),
    /// A store failure, reported with a fixed message and the raw detail.
    #[error("{message}: {detail}")]
    Internal {
        message: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// Maps a catalog error, using `message` as the body text of a 500.
    pub fn from_catalog(err: CatalogError, message: &'static str) -> Self {
        match err {
            CatalogError::InvalidReferenceFormat { .. } | CatalogError::InvalidAssociation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CatalogError::Validation(errors) => ApiError::Validation(errors),
            CatalogError::ReferenceNotFound { .. } => ApiError::NotFound(err.to_string()),
            CatalogError::Conflict(msg) => ApiError::Conflict(msg),
            CatalogError::Store(_) | CatalogError::LinkSync { .. } => ApiError::Internal {
                message,
                detail: err.to_string(),
            },
        }
    }

    /// Returns a mapper for `Result::map_err`.
    pub fn or_internal(message: &'static str) -> impl FnOnce(CatalogError) -> ApiError {
        move |err| ApiError::from_catalog(err, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": message }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "Validation failed", "errors": errors }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": message }),
            ),
            ApiError::Conflict(message) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "message": message }),
            ),
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "message": message, "error": detail }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
