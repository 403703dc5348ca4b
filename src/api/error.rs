use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::auth::AuthError;
use crate::models::listing::TransitionError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    /// Credential verification failures, one variant per diagnostic.
    Auth(AuthError),

    /// Availability state machine rejections.
    Transition(TransitionError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Auth(err) => write!(f, "Unauthorized: {}", err),
            ApiError::Transition(err) => write!(f, "Rejected transition: {}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Machine-readable discriminator carried in every error response.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::DatabaseError(_) => "database",
            ApiError::ValidationError(_) => "validation",
            ApiError::Conflict(_) => "conflict",
            ApiError::InternalError(_) => "internal",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Auth(err) => match err {
                AuthError::MissingHeader | AuthError::MalformedHeader => "unauthorized",
                AuthError::InvalidToken => "invalid_token",
                AuthError::Expired => "token_expired",
                AuthError::Revoked => "token_revoked",
                AuthError::UnknownSubject => "unknown_subject",
            },
            ApiError::Transition(err) => match err {
                TransitionError::InvalidValue => "invalid_availability",
                TransitionError::WrongStatus { .. } => "wrong_status",
                TransitionError::IllegalTransition(_) => "illegal_transition",
                TransitionError::CorruptState(_) => "corrupt_state",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Auth(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::Transition(err) => {
                let status = match err {
                    // A stored status/availability that no longer parses is a
                    // server-side invariant break, not a client mistake.
                    TransitionError::CorruptState(_) => {
                        tracing::error!("Corrupt listing state: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
        };

        let body = ApiResponse::<()>::error_with_code(error_message, code);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::Transition(err)
    }
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn post_not_found() -> Self {
        ApiError::NotFound("Post not found.".to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }
}
