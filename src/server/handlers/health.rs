use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let chunks = state
        .engine
        .chunk_count()
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "status": "ok",
        "chunks": chunks,
        "llm_model": state.settings.models.llm_model,
        "embedding_model": state.settings.models.embedding_model,
        "retrieval_k": state.settings.retrieval.k,
    })))
}
