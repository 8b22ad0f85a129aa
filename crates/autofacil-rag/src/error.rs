//! Error types for the RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload payload is not valid base64
    #[error("Invalid base64 payload")]
    InvalidEncoding,

    /// Non-PDF upload is not valid UTF-8
    #[error("File '{filename}' is not valid UTF-8 text")]
    UndecodableText { filename: String },

    /// PDF upload could not be parsed
    #[error("Failed to parse PDF '{filename}': {message}")]
    CorruptDocument { filename: String, message: String },

    /// Blank question submitted to the query pipeline
    #[error("Question is empty")]
    EmptyQuestion,

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// No records indexed under the given source
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

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
    /// Create a corrupt document error
    pub fn corrupt_document(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptDocument {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Errors caused by the caller's input. These are answered with a
    /// structured payload instead of failing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidEncoding
                | Error::UndecodableText { .. }
                | Error::CorruptDocument { .. }
                | Error::EmptyQuestion
        )
    }

    /// Message shown to API users
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidEncoding => "Base64 inválido.".to_string(),
            Error::UndecodableText { filename } => {
                format!("O arquivo '{}' não é um texto UTF-8 válido.", filename)
            }
            Error::CorruptDocument { filename, .. } => {
                format!("Não foi possível ler o PDF '{}'.", filename)
            }
            Error::EmptyQuestion => "pergunta não informada".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::InvalidEncoding => (StatusCode::BAD_REQUEST, "invalid_encoding"),
            Error::UndecodableText { .. } => (StatusCode::BAD_REQUEST, "undecodable_text"),
            Error::CorruptDocument { .. } => (StatusCode::BAD_REQUEST, "corrupt_document"),
            Error::EmptyQuestion => (StatusCode::BAD_REQUEST, "empty_question"),
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.user_message(),
            }
        }));

        (status, body).into_response()
    }
}
