//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup-time configuration failures. Fatal for the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported provider '{0}' (expected one of: {options})", options = crate::config::Provider::NAMES.join(", "))]
    UnsupportedProvider(String),
    #[error("missing connection string: set {0}")]
    MissingConnectionString(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("connection: {0}")]
    Connection(String),
    #[error("database: {0}")]
    Database(String),
    #[error("hashing: {0}")]
    Hashing(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status and machine-readable code for this error kind.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Connection(_) => (StatusCode::SERVICE_UNAVAILABLE, "connection_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "hashing_error"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("no rows returned".into()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => AppError::Connection(e.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<tiberius::error::Error> for AppError {
    fn from(e: tiberius::error::Error) -> Self {
        use tiberius::error::Error as TdsError;
        match e {
            TdsError::Io { .. } | TdsError::Tls(_) | TdsError::Routing { .. } | TdsError::Protocol(_) => {
                AppError::Connection(e.to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<bb8_tiberius::Error> for AppError {
    fn from(e: bb8_tiberius::Error) -> Self {
        AppError::Connection(e.to_string())
    }
}

impl From<bb8::RunError<bb8_tiberius::Error>> for AppError {
    fn from(e: bb8::RunError<bb8_tiberius::Error>) -> Self {
        match e {
            bb8::RunError::TimedOut => AppError::Connection("timed out waiting for a pooled connection".into()),
            bb8::RunError::User(inner) => AppError::Connection(inner.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
