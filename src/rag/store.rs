use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::document::DocumentChunk;

/// A retrieved chunk with its similarity score (higher = better).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Similarity index over one document's chunks.
///
/// Persisted as two sibling files named by the document identifier: a flat
/// little-endian f32 matrix (`<doc_id>.vec`) and a JSON metadata file
/// (`<doc_id>.json`). Immutable once built.
#[derive(Debug, Clone)]
pub struct VectorStore {
    doc_id: String,
    embedding_model: String,
    dim: usize,
    /// Row-major matrix, `chunks.len() * dim` values.
    embeddings: Vec<f32>,
    chunks: Vec<DocumentChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreMeta {
    doc_id: String,
    embedding_model: String,
    dim: usize,
    chunks: Vec<DocumentChunk>,
}

impl VectorStore {
    /// Pairs chunks with their embeddings. All embeddings must share one
    /// dimension and match the chunk count.
    pub fn build(
        doc_id: &str,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
        embedding_model: &str,
    ) -> Result<Self, ApiError> {
        if chunks.len() != embeddings.len() {
            return Err(ApiError::Internal(format!(
                "embedding count {} does not match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dim = embeddings.first().map(Vec::len).unwrap_or(0);
        if embeddings.iter().any(|e| e.len() != dim) {
            return Err(ApiError::Internal(
                "embeddings have inconsistent dimensions".to_string(),
            ));
        }

        Ok(Self {
            doc_id: doc_id.to_string(),
            embedding_model: embedding_model.to_string(),
            dim,
            embeddings: embeddings.into_iter().flatten().collect(),
            chunks,
        })
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-k chunks by cosine similarity to the query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let row = &self.embeddings[i * self.dim..(i + 1) * self.dim];
                SearchResult {
                    chunk: chunk.clone(),
                    score: cosine_similarity(query_embedding, row),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));
        scored
    }

    pub fn vector_path(dir: &Path, doc_id: &str) -> PathBuf {
        dir.join(format!("{}.vec", doc_id))
    }

    pub fn meta_path(dir: &Path, doc_id: &str) -> PathBuf {
        dir.join(format!("{}.json", doc_id))
    }

    /// Whether both persisted parts exist for a document.
    pub fn exists(dir: &Path, doc_id: &str) -> bool {
        Self::vector_path(dir, doc_id).exists() && Self::meta_path(dir, doc_id).exists()
    }

    pub fn save(&self, dir: &Path) -> Result<(), ApiError> {
        fs::create_dir_all(dir).map_err(ApiError::internal)?;

        let blob = serialize_embeddings(&self.embeddings);
        fs::write(Self::vector_path(dir, &self.doc_id), blob).map_err(ApiError::internal)?;

        let meta = StoreMeta {
            doc_id: self.doc_id.clone(),
            embedding_model: self.embedding_model.clone(),
            dim: self.dim,
            chunks: self.chunks.clone(),
        };
        let json = serde_json::to_string(&meta).map_err(ApiError::internal)?;
        fs::write(Self::meta_path(dir, &self.doc_id), json).map_err(ApiError::internal)?;

        Ok(())
    }

    /// Loads a persisted store. A vector file whose length disagrees with the
    /// metadata is treated as corrupt.
    pub fn load(dir: &Path, doc_id: &str) -> Result<Self, ApiError> {
        let meta_raw =
            fs::read_to_string(Self::meta_path(dir, doc_id)).map_err(ApiError::internal)?;
        let meta: StoreMeta = serde_json::from_str(&meta_raw).map_err(ApiError::internal)?;

        let blob = fs::read(Self::vector_path(dir, doc_id)).map_err(ApiError::internal)?;
        let embeddings = deserialize_embeddings(&blob);

        if embeddings.len() != meta.chunks.len() * meta.dim {
            return Err(ApiError::Internal(format!(
                "vector store {} is corrupt: {} values for {} chunks of dim {}",
                doc_id,
                embeddings.len(),
                meta.chunks.len(),
                meta.dim
            )));
        }

        Ok(Self {
            doc_id: meta.doc_id,
            embedding_model: meta.embedding_model,
            dim: meta.dim,
            embeddings,
            chunks: meta.chunks,
        })
    }
}

fn serialize_embeddings(embeddings: &[f32]) -> Vec<u8> {
    embeddings.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embeddings(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
