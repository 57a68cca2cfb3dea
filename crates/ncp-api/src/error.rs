use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ncp_ai::error::AiError;
use ncp_auth::error::AuthError;
use ncp_storage::error::StorageError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// 422 with one message per offending field.
    Validation {
        detail: String,
        errors: BTreeMap<String, String>,
    },
    ServiceUnavailable(String),
    /// An upstream dependency (model provider, identity provider) failed.
    Upstream(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(detail: impl Into<String>, errors: BTreeMap<String, String>) -> Self {
        ApiError::Validation {
            detail: detail.into(),
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { detail, errors } => ErrorBody {
                detail,
                errors: Some(errors),
            },
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                ErrorBody {
                    detail: "Internal server error".to_string(),
                    errors: None,
                }
            }
            ApiError::Upstream(msg) => {
                tracing::warn!("upstream error: {msg}");
                ErrorBody {
                    detail: msg,
                    errors: None,
                }
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::ServiceUnavailable(msg) => ErrorBody {
                detail: msg,
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { .. } => ApiError::NotFound("NCP not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ncp_search::error::SearchError> for ApiError {
    fn from(e: ncp_search::error::SearchError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::InvalidProvider(msg) => ApiError::BadRequest(msg),
            AiError::ProviderUnavailable(_) => ApiError::ServiceUnavailable(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::UserNotFound(_) => ApiError::NotFound(e.to_string()),
            AuthError::MissingToken => ApiError::Unauthorized(e.to_string()),
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::Jwt(_)
            | AuthError::AuthFailed(_) => {
                tracing::debug!(error = %e, "rejected credentials");
                ApiError::Unauthorized("Invalid token".to_string())
            }
            AuthError::Cognito(_) | AuthError::ChallengeRequired { .. } => ApiError::Upstream(e.to_string()),
            AuthError::Jwks(_) | AuthError::Config(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ncp_export::error::ExportError> for ApiError {
    fn from(e: ncp_export::error::ExportError) -> Self {
        match e {
            ncp_export::error::ExportError::UnknownFormat(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
