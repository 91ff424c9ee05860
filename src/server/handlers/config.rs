use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::state::AppState;

/// Effective settings after defaults and `config.yml` are applied.
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.settings.clone())
}
