//! Error types for the daybook backend
//!
//! All errors use thiserror for structured error handling and map to
//! JSON HTTP responses at the API boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Quota exhausted for {0}")]
    QuotaExhausted(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("{0}")]
    Generic(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound(_) | AppError::TaskNotFound(_) | AppError::NoteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailTaken(_) | AppError::QuotaExhausted(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
