//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from coop-core and storage failures to HTTP status
//! codes with a `{"error": "<message>"}` body. Server-side failures are
//! logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coop_core::{PaginationError, ScopeError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Payload or parameter failed validation (400).
    #[error("{0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// No valid session or token (401).
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but not assigned to the branch the operation needs (400).
    #[error("{0}")]
    MissingScope(String),

    /// Record absent, soft-deleted, or outside the caller's tenant (404).
    #[error("{0}")]
    NotFound(String),

    /// Conflict with current resource state (409).
    #[error("{0}")]
    Conflict(String),

    /// Storage operation failed (500). Message is logged, never returned.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error (500). Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::MissingScope(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Internal(_))
    }

    /// The message a client is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            Self::Persistence(_) => "A storage error occurred".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ScopeError> for AppError {
    fn from(err: ScopeError) -> Self {
        Self::MissingScope(err.to_string())
    }
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::Projection(msg) => Self::Internal(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coop_core::UserId;
    use http_body_util::BodyExt;

    #[test]
    fn client_error_statuses() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingScope("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn server_error_statuses() {
        assert_eq!(
            AppError::Persistence("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_branch_maps_to_missing_scope() {
        let err: AppError = ScopeError::MissingBranch {
            user_id: UserId::new(),
        }
        .into();
        assert!(matches!(err, AppError::MissingScope(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_error_keeps_field_message() {
        let err: AppError = ValidationError::Required { field: "name" }.into();
        assert_eq!(err.public_message(), "name is required");
    }

    #[test]
    fn bad_page_size_is_a_client_error() {
        let err: AppError = PaginationError::InvalidPageSize { size: 0, max: 1000 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn persistence_error_hides_details() {
        let response =
            AppError::Persistence("connection refused at 10.0.0.5:5432".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "A storage error occurred");
        assert!(!String::from_utf8_lossy(&body).contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn not_found_body_shape() {
        let response = AppError::NotFound("bank 42 not found".into()).into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "bank 42 not found"}));
    }
}
