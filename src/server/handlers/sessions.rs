use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Vec<Value> = state
        .history
        .list_sessions()
        .into_iter()
        .map(|session| {
            json!({
                "session_id": session.session_id,
                "title": session.title,
                "document_name": session.document_name,
                "doc_id": session.doc_id,
                "created_at": session.created_at,
                "message_count": session.messages.len(),
            })
        })
        .collect();

    Ok(Json(json!({ "sessions": result })))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .history
        .get_session(&session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(Json(json!({ "session": session })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.history.delete_session(&session_id)?;
    if !deleted {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
