use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{SwapQuoteRequest, SwapQuoteResponse};
use crate::services::quote_service::format_amount;
use axum::{extract::State, Json};
use rust_decimal::Decimal;
use std::str::FromStr;

/// POST /api/swap/quote
pub async fn get_quote(
    State(state): State<AppState>,
    Json(request): Json<SwapQuoteRequest>,
) -> Result<Json<SwapQuoteResponse>> {
    let from = state
        .registry
        .get(&request.from_token)
        .ok_or_else(|| AppError::NotFound(format!("Unknown token: {}", request.from_token)))?;
    let to = state
        .registry
        .get(&request.to_token)
        .ok_or_else(|| AppError::NotFound(format!("Unknown token: {}", request.to_token)))?;

    let amount = Decimal::from_str(request.amount.trim())
        .map_err(|_| AppError::BadRequest("amount must be a decimal number".to_string()))?;

    let quote = state.quotes.quote(&amount, from, to).await?;
    let rate = (quote.amount_out / amount).round_dp(8).normalize();

    Ok(Json(SwapQuoteResponse {
        from_amount: format_amount(&amount),
        to_amount: format_amount(&quote.amount_out),
        rate: rate.to_string(),
        source: quote.source.as_str().to_string(),
    }))
}
