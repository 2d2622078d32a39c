use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;

pub const MESSAGE_BAD_REQUEST: &str = "invalid request format";
pub const MESSAGE_FAILED: &str = "something went wrong";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    /// The wrapped message is shown to callers verbatim and must not carry
    /// driver or query detail.
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();

    // Nested structs and lists report through `errors()` rather than `field_errors()`.
    if messages.is_empty() {
        messages.push(errors.to_string());
    }
    messages.sort();
    messages
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                MESSAGE_BAD_REQUEST.to_string(),
                validation_messages(&err),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), vec![]),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), vec![]),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), vec![]),
            AppError::InternalError(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), vec![])
            }
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
                vec![],
            ),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    MESSAGE_FAILED.to_string(),
                    vec![],
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    MESSAGE_FAILED.to_string(),
                    vec![],
                )
            }
        };

        ApiResponse::failure(status, message, errors).into_response()
    }
}
