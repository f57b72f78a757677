use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use gedenk_types::api::{ErrorBody, ErrorEnvelope};

/// Request-level error taxonomy. Access denials on content routes are
/// reported as `NotFound` so responses never reveal that a private memorial
/// exists.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("authentication required")]
    AuthRequired,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            ApiError::AuthRequired => {
                (StatusCode::UNAUTHORIZED, "AuthRequired", self.to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", self.to_string()),
            ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "ValidationError", self.to_string())
            }
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal",
                    "internal server error".to_string(),
                )
            }
        };

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
