//! Request-boundary error type.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl picks
//! the status code and a `{ "message": ... }` body. Server-side failures are
//! logged here and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::{jwt::TokenError, repo::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    Conflict,

    #[error("User not found")]
    NotFound,

    #[error("Invalid email/password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::MissingToken | AppError::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MissingToken => "Missing Authorization header".into(),
            AppError::Token(_) => "Invalid or expired token".into(),
            AppError::Persistence(_) | AppError::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AppError::Conflict,
            other => AppError::Persistence(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("Invalid email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Token(TokenError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Persistence(StoreError::Unavailable("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn token_kinds_share_one_message() {
        let expired = AppError::Token(TokenError::Expired).public_message();
        let forged = AppError::Token(TokenError::InvalidSignature).public_message();
        let garbage = AppError::Token(TokenError::Malformed).public_message();
        assert_eq!(expired, forged);
        assert_eq!(forged, garbage);
    }

    #[test]
    fn duplicate_store_error_becomes_conflict() {
        assert!(matches!(
            AppError::from(StoreError::Duplicate),
            AppError::Conflict
        ));
        assert!(matches!(
            AppError::from(StoreError::Unavailable("x".into())),
            AppError::Persistence(_)
        ));
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("relation \"users\" does not exist"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
