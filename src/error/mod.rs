use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::messaging::MessagingError;
use crate::slideshow::SlideshowError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, client_message, log_message) = match &self {
            AppError::Config(e) => {
                let log_msg = e.to_string();
                let client_msg = if is_production() {
                    "Configuration error".to_string()
                } else {
                    log_msg.clone()
                };
                ("CONFIG_ERROR", client_msg, log_msg)
            }
            AppError::Auth(msg) => ("UNAUTHORIZED", msg.clone(), msg.clone()),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg.clone(), msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone(), msg.clone()),
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), msg.clone()),
            AppError::Conflict(msg) => ("CONFLICT", msg.clone(), msg.clone()),
            AppError::Internal(e) => {
                let log_msg = e.clone();
                let client_msg = if is_production() {
                    "Internal server error".to_string()
                } else {
                    log_msg.clone()
                };
                ("INTERNAL_ERROR", client_msg, log_msg)
            }
        };

        if status.is_server_error() {
            tracing::error!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SlideshowError> for AppError {
    fn from(err: SlideshowError) -> Self {
        match err {
            SlideshowError::Forbidden(msg) => AppError::Forbidden(msg),
            SlideshowError::Conflict(msg) => AppError::Conflict(msg),
            SlideshowError::BadRequest(msg) => AppError::Validation(msg),
            SlideshowError::NotFound(msg) => AppError::NotFound(msg),
            SlideshowError::Internal(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::Forbidden(msg) => AppError::Forbidden(msg),
            MessagingError::BadRequest(msg) => AppError::Validation(msg),
            MessagingError::NotFound(msg) => AppError::NotFound(msg),
            MessagingError::Internal(e) => AppError::Internal(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_slideshow_errors_map_to_status() {
        let cases = [
            (SlideshowError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (SlideshowError::Conflict("x".into()), StatusCode::CONFLICT),
            (SlideshowError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (SlideshowError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                SlideshowError::Internal(StoreError::Unavailable("db down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Conflict("busy".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
