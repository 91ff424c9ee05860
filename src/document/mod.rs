//! PDF loading and chunking.
//!
//! Turns an uploaded PDF into overlapping text chunks tagged with the
//! document identifier, source filename and page number. The identifier is a
//! hash of the raw bytes, so the same file uploaded twice maps to the same
//! document regardless of its name.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::ApiError;

/// A bounded text span extracted from one page of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// 1-based page number the chunk was extracted from.
    pub page: usize,
    /// Content hash of the owning document.
    pub doc_id: String,
    /// Filename the document was uploaded as.
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Content-addressed identifier for a document: SHA-256 of the raw bytes.
    pub fn doc_id(content: &[u8]) -> String {
        let digest = Sha256::digest(content);
        hex::encode(digest)
    }

    /// Extracts text per page and splits it into overlapping chunks.
    ///
    /// Returns the chunks together with the document identifier. A malformed
    /// PDF fails as a whole; there is no partial result.
    pub fn load_and_split(
        &self,
        content: &[u8],
        filename: &str,
    ) -> Result<(Vec<DocumentChunk>, String), ApiError> {
        let doc_id = Self::doc_id(content);

        let pages = pdf_extract::extract_text_from_mem_by_pages(content)
            .map_err(|e| ApiError::BadRequest(format!("Could not read PDF: {}", e)))?;

        let mut chunks = Vec::new();
        for (page_index, page_text) in pages.iter().enumerate() {
            for text in self.split_text(page_text) {
                chunks.push(DocumentChunk {
                    text,
                    page: page_index + 1,
                    doc_id: doc_id.clone(),
                    source: filename.to_string(),
                });
            }
        }

        Ok((chunks, doc_id))
    }

    /// Splits text into chunks of `chunk_size` characters, consecutive chunks
    /// sharing `chunk_overlap` characters. Whitespace-only spans are dropped.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let chunk: String = chars[start..end].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
            if end >= total {
                break;
            }
            start += step;
        }

        chunks
    }
}
