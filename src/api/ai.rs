use super::AppState;
use crate::error::Result;
use crate::models::{SwapChatRequest, SwapChatResponse};
use axum::{extract::State, Json};

/// POST /api/ai/swap
pub async fn swap_chat(
    State(state): State<AppState>,
    Json(request): Json<SwapChatRequest>,
) -> Result<Json<SwapChatResponse>> {
    let response = state.dialogue.handle(request).await?;
    Ok(Json(response))
}
