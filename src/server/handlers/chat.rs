use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Chunk text is shortened for the citation expander in the UI.
const SOURCE_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// One chat turn: persist the question, retrieve + generate, persist the
/// answer. Each turn is answered independently of prior turns.
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question must not be empty".to_string()));
    }

    let session = state
        .history
        .get_session(&session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    state.history.add_message(&session_id, "user", question)?;

    let store = state.vectors.load(&session.doc_id).ok_or_else(|| {
        ApiError::NotFound("Vector store not found. Please re-upload the document.".to_string())
    })?;

    let result = state.qa.ask(question, &store).await?;

    state
        .history
        .add_message(&session_id, "assistant", &result.answer)?;

    let sources: Vec<Value> = result
        .sources
        .iter()
        .map(|source| {
            json!({
                "text": preview(&source.chunk.text),
                "page": source.chunk.page,
                "source": source.chunk.source,
            })
        })
        .collect();

    Ok(Json(json!({
        "answer": result.answer,
        "sources": sources,
    })))
}

fn preview(text: &str) -> String {
    if text.chars().count() > SOURCE_PREVIEW_CHARS {
        let truncated: String = text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_chunks() {
        let short = "a short chunk";
        assert_eq!(preview(short), short);

        let long = "y".repeat(400);
        let previewed = preview(&long);
        assert_eq!(previewed.chars().count(), SOURCE_PREVIEW_CHARS + 3);
        assert!(previewed.ends_with("..."));
    }
}
