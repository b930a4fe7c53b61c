//! API error handling
//!
//! Failures are typed values carrying {kind, code, message} that every
//! layer can match on; nothing internal is thrown across the HTTP
//! boundary. `IntoResponse` renders the uniform envelope:
//!
//! ```json
//! {"success": false,
//!  "error": {"message": "...", "code": "TOKEN_EXPIRED",
//!            "statusCode": 401, "timestamp": "2026-01-01T00:00:00Z"}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::repository::RepositoryError;

/// The uniform error envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

/// Application error kinds
///
/// Each variant maps to an HTTP status class and carries the
/// machine-readable code surfaced to clients.
#[derive(Debug)]
pub enum AppError {
    BadRequest { code: &'static str, message: String },
    Unauthorized { code: &'static str, message: String },
    Forbidden { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Internal { message: String },
    Database { message: String },
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } | AppError::Database { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. } => code,
            AppError::Internal { .. } => "INTERNAL_SERVER_ERROR",
            AppError::Database { .. } => "DATABASE_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Internal { message }
            | AppError::Database { message } => message,
        }
    }

    /// Render the envelope body for this error
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: ErrorDetail {
                message: self.message().to_string(),
                code: self.code().to_string(),
                status_code: self.status().as_u16(),
                timestamp: Utc::now(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Every failure is logged with its context before translation;
        // server-side faults at ERROR, client faults at WARN.
        if status.is_server_error() {
            tracing::error!(code = self.code(), message = self.message(), "request failed");
        } else {
            tracing::warn!(code = self.code(), message = self.message(), "request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Database {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}
