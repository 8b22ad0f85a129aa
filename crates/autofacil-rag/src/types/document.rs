//! Document and chunk types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upload formats the extractor distinguishes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Anything else, decoded as UTF-8 text
    Text,
}

impl FileType {
    /// Detect file type from a filename.
    ///
    /// Only a `.pdf` suffix (any case) is recognized; every other name is
    /// treated as plain text.
    pub fn from_filename(filename: &str) -> Self {
        let is_pdf = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            Self::Pdf
        } else {
            Self::Text
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Text => "Text",
        }
    }
}

/// Metadata stored alongside every indexed chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Filename the chunk was extracted from
    pub source: String,
    /// Position of the chunk within its document
    pub chunk_index: u32,
}

/// A chunk of document text, the unit of embedding and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub content: String,
    /// Source metadata
    pub metadata: ChunkMetadata,
    /// Embedding vector (empty until the chunk is embedded)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a new, not yet embedded chunk
    pub fn new(source: impl Into<String>, content: String, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            metadata: ChunkMetadata {
                source: source.into(),
                chunk_index,
            },
            embedding: Vec::new(),
        }
    }

    /// Filename this chunk belongs to
    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    /// Set the embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("manual.pdf"), FileType::Pdf);
        assert_eq!(FileType::from_filename("MANUAL.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.txt"), FileType::Text);
        assert_eq!(FileType::from_filename("report.pdf.txt"), FileType::Text);
        assert_eq!(FileType::from_filename("pdf"), FileType::Text);
        assert_eq!(FileType::from_filename("data.docx"), FileType::Text);
    }

    #[test]
    fn test_chunk_tagging() {
        let chunk = Chunk::new("notes.txt", "Warranty: 1 year.".to_string(), 3);
        assert_eq!(chunk.source(), "notes.txt");
        assert_eq!(chunk.metadata.chunk_index, 3);
        assert!(chunk.embedding.is_empty());

        let chunk = chunk.with_embedding(vec![0.1, 0.2]);
        assert_eq!(chunk.embedding.len(), 2);
    }
}
