use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn save_failed(source: StorageError) -> Self {
        ApiError::Storage {
            message: "Failed to save submission",
            source,
        }
    }

    pub fn load_failed(source: StorageError) -> Self {
        ApiError::Storage {
            message: "Failed to load submissions",
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "validation_error", message.clone())
            }
            ApiError::Storage { message, source } => {
                tracing::error!(error = %source, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    message.to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
