use std::sync::Arc;

use anyhow::Context;

use crate::core::config::{AppPaths, Settings};
use crate::document::DocumentProcessor;
use crate::history::SessionStore;
use crate::llm::{LlmProvider, OllamaProvider};
use crate::qa::QaSystem;
use crate::rag::VectorStoreManager;

/// Application state shared across all routes.
///
/// Every component is constructed exactly once here, with its lifetime bound
/// to the process; handlers receive the state explicitly instead of reaching
/// for globals.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub provider: Arc<dyn LlmProvider>,
    pub documents: DocumentProcessor,
    pub vectors: VectorStoreManager,
    pub qa: QaSystem,
    pub history: SessionStore,
}

impl AppState {
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths);
        Self::with_parts(paths, settings)
    }

    /// Wires the components from explicit parts. Tests use this with temp
    /// paths and a mock provider via [`AppState::with_provider`].
    pub fn with_parts(paths: Arc<AppPaths>, settings: Settings) -> anyhow::Result<Arc<Self>> {
        let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(&settings.ollama));
        Self::with_provider(paths, settings, provider)
    }

    pub fn with_provider(
        paths: Arc<AppPaths>,
        settings: Settings,
        provider: Arc<dyn LlmProvider>,
    ) -> anyhow::Result<Arc<Self>> {
        let documents = DocumentProcessor::new(
            settings.indexing.chunk_size,
            settings.indexing.chunk_overlap,
        );

        let vectors = VectorStoreManager::new(
            paths.vector_store_dir.clone(),
            provider.clone(),
            settings.ollama.embedding_model.clone(),
        );

        let qa = QaSystem::new(provider.clone(), settings.qa.top_k, settings.qa.temperature);

        let history = SessionStore::new(paths.chat_history_dir.clone())
            .context("failed to open chat history store")?;

        Ok(Arc::new(AppState {
            paths,
            settings,
            provider,
            documents,
            vectors,
            qa,
            history,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;

    #[test]
    fn initialize_wires_components_from_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::with_data_dir(
            tmp.path().to_path_buf(),
            tmp.path().join("data"),
        ));

        let state = AppState::with_provider(
            paths,
            Settings::default(),
            Arc::new(MockProvider::new("ok")),
        )
        .unwrap();

        assert_eq!(state.provider.name(), "mock");
        assert_eq!(state.history.session_count(), 0);
        assert!(state.paths.vector_store_dir.is_dir());
    }
}
