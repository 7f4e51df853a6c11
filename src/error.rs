use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Document store error: {0}")]
    Store(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Message safe to hand back to a caller. Store details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Store(_) => "Internal server error".to_string(),
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Store(e) => {
                tracing::error!(error = %e, "Document store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotAuthenticated => {
                tracing::debug!("Caller not authenticated");
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                StatusCode::BAD_REQUEST
            }
        };

        let body = Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}
