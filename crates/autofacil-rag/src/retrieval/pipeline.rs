//! Query pipeline: embed, retrieve, prompt, complete

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};

/// Answer to a user question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The question as submitted
    pub question: String,
    /// Model output, trimmed
    pub answer: String,
    /// Distinct sources of the retrieved chunks, in rank order
    pub sources: Vec<String>,
}

/// Answers questions from indexed chunks
pub struct QueryPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer a question. Blank questions fail before any collaborator is called.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let start = Instant::now();
        tracing::info!("Query: \"{}\"", question);

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.store.search(&query_embedding, self.top_k, None).await?;

        if results.is_empty() {
            tracing::debug!("No chunks retrieved, prompting with empty context");
        }

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);
        let answer = self.llm.complete(&prompt).await?;

        let mut sources: Vec<String> = Vec::new();
        for result in &results {
            let source = result.chunk.source();
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }

        tracing::info!(
            "Answered with {} chunks from {} sources in {}ms",
            results.len(),
            sources.len(),
            start.elapsed().as_millis()
        );

        Ok(Answer {
            question: question.to_string(),
            answer: answer.trim().to_string(),
            sources,
        })
    }
}
