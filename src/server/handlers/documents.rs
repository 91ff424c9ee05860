use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Handles a PDF upload: split into chunks, build or reuse the vector store,
/// open a fresh chat session for the document.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|name| name.to_string()) else {
            continue;
        };
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, content));
        break;
    }

    let (filename, content) =
        upload.ok_or_else(|| ApiError::BadRequest("Upload is missing a file".to_string()))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest(
            "Only PDF files are supported".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    // PDF parsing is CPU-bound; keep it off the async workers.
    let processor = state.documents.clone();
    let name = filename.clone();
    let (chunks, doc_id) =
        tokio::task::spawn_blocking(move || processor.load_and_split(&content, &name))
            .await
            .map_err(ApiError::internal)??;

    if chunks.is_empty() {
        return Err(ApiError::BadRequest(
            "No extractable text found in the PDF".to_string(),
        ));
    }

    let store = state.vectors.get_or_create(chunks, &doc_id).await?;
    let session_id = state.history.create_session(&filename, &doc_id)?;

    tracing::info!(
        "Processed {} into {} chunks (doc {})",
        filename,
        store.len(),
        doc_id
    );

    Ok(Json(json!({
        "session_id": session_id,
        "doc_id": doc_id,
        "document_name": filename,
        "chunk_count": store.len(),
    })))
}
