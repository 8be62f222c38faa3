use super::AppState;
use crate::models::TokenDescriptor;
use axum::{extract::State, Json};

/// GET /api/tokens
pub async fn list_tokens(State(state): State<AppState>) -> Json<Vec<TokenDescriptor>> {
    Json(state.registry.tokens().to_vec())
}
