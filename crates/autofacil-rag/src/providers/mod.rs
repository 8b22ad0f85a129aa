//! Provider abstractions for embeddings, LLM and vector storage
//!
//! The pipelines only see these traits; concrete clients are created once
//! at startup and injected through `AppState`.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod openai;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use local::SqliteVectorStore;
pub use openai::{OpenAiClient, OpenAiEmbedder, OpenAiLlm};
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
