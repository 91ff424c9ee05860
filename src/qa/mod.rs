//! Retrieval-augmented question answering.
//!
//! One question maps to one retrieval call and one generation call. No
//! conversation memory is fed back into the prompt.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::{SearchResult, VectorStore};

const PROMPT_TEMPLATE: &str = "You are a helpful research assistant. Use the following context from the research paper to answer the question.
If you cannot find the answer in the context, say so clearly.

Context: {context}

Question: {question}

Answer: ";

/// Generated answer plus the chunks it was grounded on, in rank order.
#[derive(Debug, Clone)]
pub struct QaResult {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

pub struct QaSystem {
    provider: Arc<dyn LlmProvider>,
    top_k: usize,
    temperature: f64,
}

impl QaSystem {
    pub fn new(provider: Arc<dyn LlmProvider>, top_k: usize, temperature: f64) -> Self {
        Self {
            provider,
            top_k,
            temperature,
        }
    }

    /// Embeds the question, retrieves the top-k most similar chunks and asks
    /// the model for an answer grounded in them. An index with no matching
    /// content still produces an answer (the prompt instructs the model to
    /// say when the context is insufficient).
    pub async fn ask(&self, question: &str, store: &VectorStore) -> Result<QaResult, ApiError> {
        let query = self
            .provider
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("provider returned no query embedding".to_string()))?;

        let sources = store.search(&query, self.top_k);

        let context = sources
            .iter()
            .map(|s| s.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = build_prompt(&context, question);

        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(self.temperature);
        let answer = self.provider.chat(request).await?;

        Ok(QaResult { answer, sources })
    }
}

fn build_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentChunk;
    use crate::llm::mock::MockProvider;

    fn make_store(texts: &[&str]) -> VectorStore {
        let chunks: Vec<DocumentChunk> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| DocumentChunk {
                text: text.to_string(),
                page: i + 1,
                doc_id: "doc".to_string(),
                source: "paper.pdf".to_string(),
            })
            .collect();

        let embeddings: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| MockProvider::embedding_for(text))
            .collect();

        VectorStore::build("doc", chunks, embeddings, "mock-embed").unwrap()
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = build_prompt("some context", "what is it?");
        assert!(prompt.contains("Context: some context"));
        assert!(prompt.contains("Question: what is it?"));
        assert!(prompt.starts_with("You are a helpful research assistant."));
    }

    #[tokio::test]
    async fn ask_returns_answer_with_ranked_sources() {
        let provider = Arc::new(MockProvider::new("The sky is blue."));
        let qa = QaSystem::new(provider.clone(), 2, 0.1);
        let store = make_store(&[
            "the sky is blue and vast",
            "the ocean is deep",
            "numbers are abstract",
        ]);

        let result = qa.ask("what color is the sky", &store).await.unwrap();

        assert_eq!(result.answer, "The sky is blue.");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].chunk.text, "the sky is blue and vast");

        let prompt = provider.last_prompt().expect("chat should have been called");
        assert!(prompt.contains("the sky is blue and vast"));
        assert!(prompt.contains("what color is the sky"));
    }

    #[tokio::test]
    async fn ask_against_empty_store_still_answers() {
        let provider = Arc::new(MockProvider::new("I cannot find that in the context."));
        let qa = QaSystem::new(provider, 4, 0.1);
        let store = VectorStore::build("doc", vec![], vec![], "mock-embed").unwrap();

        let result = qa.ask("anything?", &store).await.unwrap();

        assert_eq!(result.answer, "I cannot find that in the context.");
        assert!(result.sources.is_empty());
    }
}
