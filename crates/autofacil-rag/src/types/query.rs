//! Request bodies accepted by the HTTP API

use serde::{Deserialize, Serialize};

/// Body of `POST /webhook/ingest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Original filename; also the `source` tag of every chunk
    pub filename: String,
    /// Base64-encoded file content
    pub content: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    pub question: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_rejected() {
        assert!(serde_json::from_str::<IngestRequest>(r#"{"filename": "a.txt"}"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{}"#).is_err());

        let request: ChatRequest = serde_json::from_str(r#"{"question": "  "}"#).unwrap();
        assert_eq!(request.question, "  ");
    }
}
