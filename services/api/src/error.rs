//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::identity::IdentityError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials were checked and refused
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing entity, or one the caller may not see
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials | IdentityError::InactiveAccount => {
                ApiError::AuthenticationFailed(err.to_string())
            }
            IdentityError::NotFound => ApiError::NotFound(err.to_string()),
            IdentityError::DependentLimitExceeded
            | IdentityError::ParentNotFound
            | IdentityError::ParentIsDependent
            | IdentityError::HasDependents
            | IdentityError::DuplicateUsername
            | IdentityError::DuplicateEmail
            | IdentityError::Validation(_) => ApiError::BadRequest(err.to_string()),
            IdentityError::Hash(e) => {
                error!("Password hashing failed: {}", e);
                ApiError::InternalServerError
            }
            IdentityError::Database(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::AuthenticationFailed(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) if e.is_integrity_violation() => (
                StatusCode::BAD_REQUEST,
                "Integrity constraint violated".to_string(),
            ),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
