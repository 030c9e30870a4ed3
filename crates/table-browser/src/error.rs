use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("table not found: {0}")]
    NotFound(String),

    #[error("schema changed while the request was running: {0}")]
    SchemaViolation(String),

    #[error("table has no single-column primary key: {0}")]
    NoPrimaryKey(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The detail is kept for logs only; `Display` never shows it.
    #[error("database request failed")]
    BackendUnavailable(String),

    #[error("failed to open database: {path}: {source}")]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::BackendUnavailable(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::BackendUnavailable(e.to_string())
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SchemaViolation(_) => "SCHEMA_VIOLATION",
            AppError::NoPrimaryKey(_) => "NO_PRIMARY_KEY",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::BackendUnavailable(_) | AppError::DbOpenFailed { .. } => "BACKEND_UNAVAILABLE",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "INVALID_ARGUMENT",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// Status the routing layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::SchemaViolation(_) => 409,
            AppError::NoPrimaryKey(_) | AppError::InvalidArgument(_) | AppError::Json(_) => 400,
            AppError::BackendUnavailable(_) | AppError::DbOpenFailed { .. } => 503,
            AppError::Io(_) | AppError::Internal(_) => 500,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
