use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::common::{ApiResponse, FieldError};
use crate::utils::error_codes;

/// 会话过期时返回给客户端的消息，客户端据此强制重新登录
pub const SESSION_EXPIRED_MESSAGE: &str = "Token expired";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authorized")]
    Unauthorized,
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Internal server error")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Unauthorized | AppError::SessionExpired | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED)
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::Conflict(_) => (StatusCode::CONFLICT, error_codes::ALREADY_EXISTS),
            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                error_codes::VALIDATION_ERROR,
            ),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            _ => {}
        }

        let msg = self.to_string();
        let errors = match self {
            AppError::Validation(errors) => errors,
            _ => Vec::new(),
        };

        let body = Json(ApiResponse::<()> {
            code,
            msg,
            resp_data: None,
            errors,
        });

        (status, body).into_response()
    }
}
