//! Scripted provider for tests. Embeddings are deterministic bag-of-words
//! vectors, so cosine similarity ranks chunks by term overlap.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const DIM: usize = 256;

pub struct MockProvider {
    answer: String,
    embed_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            embed_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Number of `embed` calls made so far.
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// The content of the last message sent to `chat`.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    /// The deterministic embedding `embed` produces for one text.
    pub fn embedding_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIM];
        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            vector[(hasher.finish() as usize) % DIM] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let prompt = request.messages.last().map(|m| m.content.clone());
        *self.last_prompt.lock().unwrap() = prompt;
        Ok(self.answer.clone())
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|text| Self::embedding_for(text)).collect())
    }
}
