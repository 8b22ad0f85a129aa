//! Core types for the RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkMetadata, FileType};
pub use query::{ChatRequest, IngestRequest};
pub use response::{ChatResponse, IngestResponse, SourceSummary};
