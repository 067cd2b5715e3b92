//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use helpdesk_types::error::ChatError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat core errors.
    Chat(ChatError),
    /// Malformed request input caught before reaching the core.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::Validation(msg)) | AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::AuthenticationRequired) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Sign in again to continue".to_string(),
            ),
            AppError::Chat(ChatError::AuthenticationInvalid(_)) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_INVALID",
                "Credential could not be read; sign in again".to_string(),
            ),
            AppError::Chat(ChatError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Chat not found".to_string())
            }
            AppError::Chat(ChatError::DuplicateId { attempts }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DUPLICATE_ID",
                format!("Could not allocate a chat id after {attempts} attempts"),
            ),
            AppError::Chat(ChatError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Storage unavailable".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        // Details stay in the log; the response carries only the generic message.
        if status.is_server_error() {
            tracing::error!(code, error = ?self, "Request failed");
        } else {
            tracing::debug!(code, error = ?self, "Request rejected");
        }

        (status, ApiResponse::<()>::error(code, &message)).into_response()
    }
}
