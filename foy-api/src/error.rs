use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use foy_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Authentication required")]
    AuthenticationError,
    #[error("Not allowed")]
    AuthorizationError,
    #[error("{0} not found")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        AppError::Internal(anyhow::anyhow!(err.to_string()))
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::NotFound(what) => AppError::NotFoundError(what),
            e @ CoreError::InvalidTransition { .. } => AppError::ConflictError(e.to_string()),
            CoreError::InternalError(msg) => AppError::internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthenticationError => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::AuthorizationError => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFoundError(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
