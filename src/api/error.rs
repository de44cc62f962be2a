//! Error taxonomy shared by every handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// JSON body returned for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input, rejected before touching storage.
    #[error("{0}")]
    Validation(String),
    /// Duplicate verified account, or a stale verify/revoke target.
    #[error("{0}")]
    Conflict(String),
    /// Unknown email, account or stream.
    #[error("{0}")]
    NotFound(String),
    /// Cooldown or daily quota, with a wait countdown or the daily message.
    #[error("{0}")]
    RateLimited(String),
    /// Wrong or absent verification code; the two are indistinguishable on
    /// purpose so callers cannot probe for live codes.
    #[error("Invalid code")]
    InvalidCode,
    #[error("Code expired")]
    CodeExpired,
    /// Missing, expired or revoked session.
    #[error("Unauthorized")]
    Unauthorized,
    /// Credential sign-in failure; deliberately identical across missing
    /// account, missing password hash, unverified account, and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Stream exists but is switched off.
    #[error("{0}")]
    Inactive(String),
    /// Adapter misconfiguration or unsupported provider type.
    #[error("{0}")]
    Provider(String),
    /// Unexpected store or transport failure; the cause is logged, never
    /// returned.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCode | Self::CodeExpired => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Inactive(_) => StatusCode::GONE,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Provider(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref cause) = self {
            error!("Internal error: {cause:?}");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::CodeExpired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("exists".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Inactive("off".into()).status(), StatusCode::GONE);
        assert_eq!(
            ApiError::RateLimited("wait".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Provider("unsupported".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_message_is_generic() {
        let err = ApiError::Internal(anyhow!("connection refused to 10.0.0.7"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn from_sqlx_error_is_internal() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_serializes() {
        let body = ErrorBody {
            error: "Invalid code".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Invalid code"}"#);
    }
}
