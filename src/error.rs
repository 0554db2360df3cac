use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Typed failures of the auth core. Handlers never see raw store or
/// crypto errors, only these.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    AlreadyExists,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("trial period has ended")]
    TrialExpired,
    #[error("missing or malformed credentials")]
    Unauthorized,
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    InvalidToken,
    #[error("no password reset pending")]
    NoPendingReset,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password too short")]
    WeakPassword,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation => AuthError::AlreadyExists,
            StoreError::Database(e) => AuthError::Internal(e.into()),
        }
    }
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::AlreadyExists | AuthError::NoPendingReset => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials
            | AuthError::Unauthorized
            | AuthError::Expired
            | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TrialExpired => StatusCode::FORBIDDEN,
            AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal causes are logged here and never sent to the client.
        let message = match &self {
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_already_exists() {
        let err: AuthError = StoreError::UniqueViolation.into();
        assert!(matches!(err, AuthError::AlreadyExists));
    }

    #[test]
    fn credential_failures_share_a_status() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_error_hides_cause() {
        let err = AuthError::Internal(anyhow::anyhow!("pool exhausted"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
