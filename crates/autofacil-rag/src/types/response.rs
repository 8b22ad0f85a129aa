//! Response bodies returned by the HTTP API
//!
//! Field names follow the public contract clients already depend on.

use serde::{Deserialize, Serialize};

/// Outcome flag of an ingestion request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IngestStatus {
    #[serde(rename = "sucesso")]
    Success,
    #[serde(rename = "erro")]
    Error,
}

/// Body of the `POST /webhook/ingest` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: IngestStatus,
    /// Ingested filename
    #[serde(rename = "arquivo", skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Number of chunks now indexed for the file
    #[serde(rename = "chunks_indexados", skip_serializing_if = "Option::is_none")]
    pub chunks_indexed: Option<usize>,
    /// Error description
    #[serde(rename = "mensagem", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IngestResponse {
    pub fn success(filename: String, chunks_indexed: usize) -> Self {
        Self {
            status: IngestStatus::Success,
            filename: Some(filename),
            chunks_indexed: Some(chunks_indexed),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Error,
            filename: None,
            chunks_indexed: None,
            message: Some(message.into()),
        }
    }
}

/// Body of the `POST /chat` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Answer {
        #[serde(rename = "pergunta")]
        question: String,
        #[serde(rename = "resposta")]
        answer: String,
    },
    Error {
        #[serde(rename = "erro")]
        error: String,
    },
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Number of indexed chunks for one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: String,
    pub chunks: usize,
}

/// Body of `GET /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<SourceSummary>,
    pub total_chunks: usize,
}

impl DocumentListResponse {
    pub fn new(documents: Vec<SourceSummary>) -> Self {
        let total_chunks = documents.iter().map(|d| d.chunks).sum();
        Self {
            documents,
            total_chunks,
        }
    }
}

/// Body of `DELETE /documents/:filename`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: IngestStatus,
    #[serde(rename = "arquivo")]
    pub filename: String,
    #[serde(rename = "chunks_removidos")]
    pub chunks_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingest_wire_format() {
        let ok = serde_json::to_value(IngestResponse::success("notes.txt".to_string(), 1)).unwrap();
        assert_eq!(
            ok,
            json!({"status": "sucesso", "arquivo": "notes.txt", "chunks_indexados": 1})
        );

        let err = serde_json::to_value(IngestResponse::error("Base64 inválido.")).unwrap();
        assert_eq!(err, json!({"status": "erro", "mensagem": "Base64 inválido."}));
    }

    #[test]
    fn test_chat_wire_format() {
        let answer = ChatResponse::Answer {
            question: "What is the warranty?".to_string(),
            answer: "1 year.".to_string(),
        };
        assert_eq!(
            serde_json::to_value(answer).unwrap(),
            json!({"pergunta": "What is the warranty?", "resposta": "1 year."})
        );

        let error = ChatResponse::Error {
            error: "pergunta não informada".to_string(),
        };
        assert_eq!(
            serde_json::to_value(error).unwrap(),
            json!({"erro": "pergunta não informada"})
        );
    }

    #[test]
    fn test_document_list_totals() {
        let list = DocumentListResponse::new(vec![
            SourceSummary { source: "a.txt".to_string(), chunks: 2 },
            SourceSummary { source: "b.pdf".to_string(), chunks: 5 },
        ]);
        assert_eq!(list.total_chunks, 7);
    }
}
