//! Error types for the chatbot service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for chatbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chatbot service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The data root could not be enumerated at all
    #[error("Failed to read data root '{path}': {message}")]
    DataRoot { path: String, message: String },

    /// A store artifact was missing, truncated, or failed to decode
    #[error("Store artifact '{path}' is unusable: {message}")]
    StoreFormat { path: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Completion endpoint answered with a non-success status
    #[error("Completion request failed with status {status}: {body}")]
    CompletionStatus { status: u16, body: String },

    /// Completion endpoint answered with a body we could not interpret
    #[error("Completion response malformed: {0}")]
    CompletionResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a data root error
    pub fn data_root(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a store format error
    pub fn store_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a completion response error
    pub fn completion_response(message: impl Into<String>) -> Self {
        Self::CompletionResponse(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::DataRoot { path, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "data_root_error",
                format!("Failed to read data root '{}': {}", path, message),
            ),
            Error::StoreFormat { path, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                format!("Store artifact '{}' is unusable: {}", path, message),
            ),
            Error::Embedding(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error", msg.clone())
            }
            Error::Index(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "index_error", msg.clone())
            }
            Error::ProductNotFound(name) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Product not found: {}", name),
            ),
            Error::CompletionStatus { status, body } => (
                StatusCode::BAD_GATEWAY,
                "completion_status",
                format!("Upstream status {}: {}", status, body),
            ),
            Error::CompletionResponse(msg) => {
                (StatusCode::BAD_GATEWAY, "completion_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (
                StatusCode::BAD_GATEWAY,
                "http_error",
                err.to_string(),
            ),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
