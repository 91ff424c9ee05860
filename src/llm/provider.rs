use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Client for a local model server. One implementation talks to Ollama; tests
/// use a scripted mock.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g. "ollama").
    fn name(&self) -> &str;

    /// Check whether the server is reachable.
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// Chat completion (non-streaming).
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// Generate one embedding per input text.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
