//! autofacil-rag: retrieval-augmented question answering over uploaded documents
//!
//! Text and PDF uploads are chunked, embedded and stored in a persistent
//! vector index keyed by filename. Questions are answered by retrieving the
//! most similar chunks and prompting a language model with them.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestOutcome, IngestPipeline};
pub use retrieval::{Answer, QueryPipeline};
pub use server::{build_router, state::AppState, RagServer};
pub use types::{Chunk, ChunkMetadata, FileType};
