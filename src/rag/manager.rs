use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::store::VectorStore;
use crate::core::errors::ApiError;
use crate::document::DocumentChunk;
use crate::llm::LlmProvider;

/// Owns the vector-store directory and an in-memory cache of loaded stores.
///
/// Stores are keyed by document identifier and never mutated once created:
/// a changed document hashes to a new identifier and gets a new store. Old
/// stores are never garbage-collected.
pub struct VectorStoreManager {
    dir: PathBuf,
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
    cache: RwLock<HashMap<String, Arc<VectorStore>>>,
}

impl VectorStoreManager {
    pub fn new(dir: PathBuf, provider: Arc<dyn LlmProvider>, embedding_model: String) -> Self {
        let _ = std::fs::create_dir_all(&dir);
        Self {
            dir,
            provider,
            embedding_model,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Whether both persisted parts exist for a document.
    pub fn exists(&self, doc_id: &str) -> bool {
        VectorStore::exists(&self.dir, doc_id)
    }

    /// Returns the existing store for `doc_id`, or embeds the chunks and
    /// builds a new one. Re-uploading identical bytes reuses the persisted
    /// store without touching the embedding provider.
    pub async fn get_or_create(
        &self,
        chunks: Vec<DocumentChunk>,
        doc_id: &str,
    ) -> Result<Arc<VectorStore>, ApiError> {
        if let Some(store) = self.load(doc_id) {
            return Ok(store);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.provider.embed(&texts).await?;

        let store = Arc::new(VectorStore::build(
            doc_id,
            chunks,
            embeddings,
            &self.embedding_model,
        )?);
        store.save(&self.dir)?;

        self.cache
            .write()
            .unwrap()
            .insert(doc_id.to_string(), store.clone());

        Ok(store)
    }

    /// Number of persisted document stores.
    pub fn document_count(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| {
                        e.path().extension().and_then(|ext| ext.to_str()) == Some("json")
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    /// Memory cache first, then disk. Load failures are logged and reported
    /// as absent.
    pub fn load(&self, doc_id: &str) -> Option<Arc<VectorStore>> {
        if let Some(store) = self.cache.read().unwrap().get(doc_id) {
            return Some(store.clone());
        }

        if !self.exists(doc_id) {
            return None;
        }

        match VectorStore::load(&self.dir, doc_id) {
            Ok(store) => {
                let store = Arc::new(store);
                self.cache
                    .write()
                    .unwrap()
                    .insert(doc_id.to_string(), store.clone());
                Some(store)
            }
            Err(err) => {
                tracing::error!("Failed to load vector store {}: {}", doc_id, err);
                None
            }
        }
    }
}
