//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::providers::{
    EmbeddingProvider, LlmProvider, OpenAiClient, OpenAiEmbedder, OpenAiLlm, SqliteVectorStore,
    VectorStoreProvider,
};
use crate::retrieval::QueryPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Vector index
    vector_store_provider: Arc<dyn VectorStoreProvider>,
    /// Embedding provider
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm_provider: Arc<dyn LlmProvider>,
    ingest_pipeline: IngestPipeline,
    query_pipeline: QueryPipeline,
}

impl AppState {
    /// Create application state with the OpenAI providers and the on-disk index
    pub async fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!("Initializing RAG application state...");

        let store = SqliteVectorStore::from_config(&config.vector_db)?;
        tracing::info!(
            "Vector index opened at {}",
            config.vector_db.index_path().display()
        );

        let client = Arc::new(OpenAiClient::new(&config.openai)?);
        let embedder = Arc::new(OpenAiEmbedder::new(Arc::clone(&client), &config.embeddings));
        let llm = Arc::new(OpenAiLlm::new(client, &config.openai));

        let state = Self::from_parts(config, embedder, llm, Arc::new(store))?;
        tracing::info!(
            "Providers initialized (embedding: {} {}d, llm: {} {}, top_k: {})",
            state.embedding_provider().name(),
            state.embedding_provider().dimensions(),
            state.llm_provider().name(),
            state.llm_provider().model(),
            state.query_pipeline().top_k()
        );
        Ok(state)
    }

    /// Assemble state from already constructed providers
    pub fn from_parts(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        vector_store_provider: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::from_config(&config.chunking)?;

        let ingest_pipeline = IngestPipeline::new(
            chunker,
            Arc::clone(&embedding_provider),
            Arc::clone(&vector_store_provider),
        );
        let query_pipeline = QueryPipeline::new(
            Arc::clone(&embedding_provider),
            Arc::clone(&vector_store_provider),
            Arc::clone(&llm_provider),
            config.retrieval.top_k,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                vector_store_provider,
                embedding_provider,
                llm_provider,
                ingest_pipeline,
                query_pipeline,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    pub fn vector_store_provider(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.vector_store_provider
    }

    pub fn ingest_pipeline(&self) -> &IngestPipeline {
        &self.inner.ingest_pipeline
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.inner.query_pipeline
    }

    /// Ready when the vector index answers
    pub async fn is_ready(&self) -> bool {
        self.inner
            .vector_store_provider
            .health_check()
            .await
            .unwrap_or(false)
    }
}
