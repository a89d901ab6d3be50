use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use corkboard_db::DbError;

use crate::password::PasswordError;

/// Every way a board operation can fail, mapped onto an HTTP status at the
/// request boundary. None of these are retried.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("login required")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    /// A reference to a user that no longer resolves.
    #[error("user {0} referenced but missing")]
    IntegrityViolation(i64),

    #[error("message content is empty")]
    ContentEmpty,

    #[error("{0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BoardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoardError::DuplicateUsername => StatusCode::CONFLICT,
            BoardError::InvalidCredentials | BoardError::Unauthorized => StatusCode::UNAUTHORIZED,
            BoardError::NotFound => StatusCode::NOT_FOUND,
            BoardError::ContentEmpty | BoardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BoardError::IntegrityViolation(_) | BoardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DbError> for BoardError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateUsername => BoardError::DuplicateUsername,
            DbError::ContentEmpty => BoardError::ContentEmpty,
            DbError::OwnerNotFound(id) => BoardError::IntegrityViolation(id),
            other => BoardError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for BoardError {
    fn from(e: PasswordError) -> Self {
        BoardError::Internal(e.to_string())
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BoardError::IntegrityViolation(_) | BoardError::Internal(_) => {
                error!("{}", self);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
