use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::engine::AnswerResponse;
use crate::history::ConversationTurn;
use crate::state::AppState;

/// One conversational turn from any UI. The caller owns the transcript
/// and sends it whole; a failed turn leaves it untouched on their side.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let response = state
        .engine
        .answer(&request.question, &request.history)
        .await?;

    Ok(Json(response))
}
