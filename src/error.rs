// error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the underlying key-value map.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt poll record: {0}")]
    Corrupt(String),
    #[error("no free poll id after {0} attempts")]
    IdSpaceExhausted(u32),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("{0}")]
    Validation(String),
    #[error("Poll not found.")]
    NotFound,
    #[error("Poll is not active.")]
    Inactive,
    #[error("Option not found.")]
    OptionNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PollError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::OptionNotFound => StatusCode::NOT_FOUND,
            Self::Inactive => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Storage(e) => {
                error!("storage failure: {}", e);
                "Storage error.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for PollError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StorageError::Database(err))
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
