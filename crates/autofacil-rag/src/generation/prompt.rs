//! Prompt template for grounded answers

use crate::providers::vector_store::VectorSearchResult;

/// Phrase the model is told to use when the context has no answer
pub const FALLBACK_ANSWER: &str = "This information is not currently available.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved chunk contents, separated by a blank line
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|result| result.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the fixed RAG prompt
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are an assistant for AutoFácil's internal knowledge base.
Answer the question using ONLY the context below.
If the answer cannot be found in the context, reply exactly: "{fallback}"
Do not use outside knowledge and do not make up information.

Context:
{context}

Question: {question}

Answer:"#,
            fallback = FALLBACK_ANSWER,
            context = context,
            question = question,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn result(content: &str) -> VectorSearchResult {
        VectorSearchResult {
            chunk: Chunk::new("notes.txt", content.to_string(), 0),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_build_context() {
        let context = PromptBuilder::build_context(&[result("Price: $50."), result("Warranty: 1 year.")]);
        assert_eq!(context, "Price: $50.\n\nWarranty: 1 year.");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_prompt_contains_parts() {
        let prompt = PromptBuilder::build_rag_prompt("What is the warranty?", "Warranty: 1 year.");
        assert!(prompt.contains("Question: What is the warranty?"));
        assert!(prompt.contains("Context:\nWarranty: 1 year."));
        assert!(prompt.contains(FALLBACK_ANSWER));
    }

    #[test]
    fn test_question_is_not_trimmed() {
        let prompt = PromptBuilder::build_rag_prompt("  spaced  ", "");
        assert!(prompt.contains("Question:   spaced  \n"));
    }
}
