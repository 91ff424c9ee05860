use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::settings::OllamaSettings;
use crate::core::errors::ApiError;

/// Ollama HTTP client. Chat goes through `/api/chat`, embeddings through
/// `/api/embed`; the model names are fixed at construction from the settings.
#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(settings: &OllamaSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = json!({
            "model": self.chat_model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(temperature) = request.temperature {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("options".to_string(), json!({ "temperature": temperature }));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Ollama chat error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let content = payload["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/api/embed", self.base_url);

        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Ollama embed error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["embeddings"].as_array() {
            for item in data {
                if let Some(vals) = item.as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Ollama embed returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn base_url_is_normalized() {
        let settings = OllamaSettings {
            base_url: "http://localhost:11434/".to_string(),
            ..OllamaSettings::default()
        };
        let provider = OllamaProvider::new(&settings);

        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    #[ignore]
    async fn live_ollama_round_trip() {
        let provider = OllamaProvider::new(&OllamaSettings::default());

        assert!(provider.health_check().await.unwrap());

        let request = ChatRequest::new(vec![ChatMessage::user("Hello")]).with_temperature(0.1);
        let answer = provider.chat(request).await.unwrap();
        assert!(!answer.is_empty());

        let embeddings = provider.embed(&["hello world".to_string()]).await.unwrap();
        assert_eq!(embeddings.len(), 1);
        assert!(!embeddings[0].is_empty());
    }
}
