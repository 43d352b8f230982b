use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// AppError
///
/// Centralized error taxonomy for the application. Handlers return this type and
/// rely on the `IntoResponse` mapping below to produce the correct HTTP status,
/// keeping status-code decisions out of the orchestration logic.
#[derive(Error, Debug)]
pub enum AppError {
    /// The requested resource (post, user) does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The current identity is not permitted to perform the operation.
    #[error("forbidden")]
    Forbidden,

    /// A storage uniqueness rule was violated (duplicate email or post title).
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Unexpected persistence failure (connection loss, unanticipated constraint).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else that should surface as a 5xx without detail.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    /// Maps each error class to its HTTP response.
    ///
    /// Recoverable business-rule conflicts are normally converted to a flash +
    /// redirect inside the handler before they reach this mapping; a bare 409 is
    /// the fallback. 5xx responses never expose internal detail in the body; the
    /// detail is logged here instead.
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            AppError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AppError::Conflict(what) => (StatusCode::CONFLICT, what.to_string()).into_response(),
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// A specialized Result type for handler and repository plumbing.
pub type Result<T> = std::result::Result<T, AppError>;
