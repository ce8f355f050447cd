//! Error types for the sync server.
//!
//! Every failure reaches the terminal as `{ "error": message }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use kaya_sync::protocol::ErrorBody;

/// Sync server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request body has the wrong shape.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Database(_) | ServerError::Migration(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(err: sqlx::Error) -> Self {
        ServerError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for ServerError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ServerError::Migration(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Sync request failed");
        } else {
            tracing::warn!(error = %self, "Sync request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
