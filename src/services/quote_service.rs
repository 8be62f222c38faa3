use crate::config::Config;
use crate::constants::{DEFAULT_EURC_USDC_RATE, DEFAULT_USDC_EURC_RATE};
use crate::error::{AppError, Result};
use crate::models::TokenDescriptor;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

// getAmountsOut(uint256,address[])
const GET_AMOUNTS_OUT_SELECTOR: &str = "d06ca61f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    Pool,
    Fallback,
}

impl QuoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSource::Pool => "pool",
            QuoteSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quote {
    pub amount_out: Decimal,
    pub source: QuoteSource,
}

/// Estimates swap output amounts. Prefers a single live `getAmountsOut`
/// round-trip against the router; any failure falls straight through to a
/// fixed approximate rate keyed by the source symbol. No retries: the
/// dialogue must always get a number back.
#[derive(Debug, Clone)]
pub struct QuoteService {
    rpc_url: String,
    router_address: String,
    timeout: Duration,
    fallback_rates: HashMap<String, Decimal>,
}

impl QuoteService {
    pub fn new(
        rpc_url: String,
        router_address: String,
        timeout_secs: u64,
        fallback_rates: HashMap<String, Decimal>,
    ) -> Self {
        Self {
            rpc_url,
            router_address,
            timeout: Duration::from_secs(timeout_secs.max(1)),
            fallback_rates,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let parse_rate = |raw: &str, default: &str| {
            Decimal::from_str(raw.trim())
                .unwrap_or_else(|_| Decimal::from_str(default).expect("default rate is decimal"))
        };
        let mut fallback_rates = HashMap::new();
        fallback_rates.insert(
            "USDC".to_string(),
            parse_rate(&config.usdc_eurc_rate, DEFAULT_USDC_EURC_RATE),
        );
        fallback_rates.insert(
            "EURC".to_string(),
            parse_rate(&config.eurc_usdc_rate, DEFAULT_EURC_USDC_RATE),
        );
        Self::new(
            config.arc_rpc_url.clone(),
            config.swap_router_address.clone(),
            config.quote_timeout_secs,
            fallback_rates,
        )
    }

    /// Estimated output for `amount_in` of `from`, denominated in `to`.
    pub async fn quote(
        &self,
        amount_in: &Decimal,
        from: &TokenDescriptor,
        to: &TokenDescriptor,
    ) -> Result<Quote> {
        if amount_in.is_sign_negative() || amount_in.is_zero() {
            return Err(AppError::BadRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        if !self.rpc_url.trim().is_empty() {
            match self.live_quote(amount_in, from, to).await {
                Ok(amount_out) => {
                    return Ok(Quote {
                        amount_out,
                        source: QuoteSource::Pool,
                    })
                }
                Err(err) => {
                    tracing::warn!(
                        "live quote {}->{} failed, using approximate rate: {}",
                        from.symbol,
                        to.symbol,
                        err
                    );
                }
            }
        }

        let rate = self.fallback_rate(&from.symbol);
        let amount_out = (amount_in * rate).round_dp(to.decimals).normalize();
        Ok(Quote {
            amount_out,
            source: QuoteSource::Fallback,
        })
    }

    fn fallback_rate(&self, from_symbol: &str) -> Decimal {
        match self.fallback_rates.get(from_symbol) {
            Some(rate) => *rate,
            None => {
                tracing::warn!("no approximate rate for {}, assuming 1:1", from_symbol);
                Decimal::ONE
            }
        }
    }

    async fn live_quote(
        &self,
        amount_in: &Decimal,
        from: &TokenDescriptor,
        to: &TokenDescriptor,
    ) -> Result<Decimal> {
        let amount_units = to_base_units(amount_in, from.decimals)?;
        let call_data = encode_get_amounts_out(amount_units, &from.address, &to.address)?;
        let url = Url::parse(self.rpc_url.trim())
            .map_err(|e| AppError::BlockchainRPC(format!("Invalid RPC URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("RPC HTTP client init failed: {}", e)))?;

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": self.router_address, "data": call_data}, "latest"],
        });
        let response = client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(format!("eth_call request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::BlockchainRPC(format!(
                "eth_call returned HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::BlockchainRPC(format!("eth_call response parse failed: {}", e)))?;
        if let Some(err) = body.get("error") {
            return Err(AppError::BlockchainRPC(format!("eth_call failed: {}", err)));
        }
        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BlockchainRPC("eth_call returned no result".to_string()))?;

        let amount_out_units = decode_amounts_result(result)?;
        Ok(from_base_units(amount_out_units, to.decimals))
    }
}

pub fn format_amount(value: &Decimal) -> String {
    value.normalize().to_string()
}

fn to_base_units(amount: &Decimal, decimals: u32) -> Result<u128> {
    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals.min(27)), 0);
    let scaled = amount
        .checked_mul(factor)
        .ok_or_else(|| AppError::BadRequest("amount out of range".to_string()))?;
    scaled
        .trunc()
        .to_u128()
        .ok_or_else(|| AppError::BadRequest("amount out of range".to_string()))
}

fn from_base_units(units: u128, decimals: u32) -> Decimal {
    let capped = i128::try_from(units).unwrap_or(i128::MAX);
    Decimal::from_i128_with_scale(capped, decimals).normalize()
}

fn pad_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(stripped)
        .map_err(|_| AppError::BadRequest(format!("Invalid token address: {}", address)))?;
    if bytes.len() != 20 {
        return Err(AppError::BadRequest(format!(
            "Invalid token address length: {}",
            address
        )));
    }
    Ok(format!("{:0>64}", hex::encode(bytes)))
}

fn encode_get_amounts_out(amount_units: u128, from_address: &str, to_address: &str) -> Result<String> {
    // selector | amountIn | path offset | path length | path[0] | path[1]
    let mut data = String::with_capacity(2 + 8 + 64 * 5);
    data.push_str("0x");
    data.push_str(GET_AMOUNTS_OUT_SELECTOR);
    data.push_str(&format!("{:064x}", amount_units));
    data.push_str(&format!("{:064x}", 0x40));
    data.push_str(&format!("{:064x}", 2));
    data.push_str(&pad_address(from_address)?);
    data.push_str(&pad_address(to_address)?);
    Ok(data)
}

fn parse_word_u128(word: &str) -> Result<u128> {
    let (high, low) = word.split_at(32);
    if u128::from_str_radix(high, 16)
        .map_err(|_| AppError::BlockchainRPC("eth_call returned non-hex data".to_string()))?
        != 0
    {
        return Err(AppError::BlockchainRPC(
            "eth_call amount exceeds u128".to_string(),
        ));
    }
    u128::from_str_radix(low, 16)
        .map_err(|_| AppError::BlockchainRPC("eth_call returned non-hex data".to_string()))
}

/// Decodes the `uint256[]` returned by `getAmountsOut`, yielding the final
/// path amount.
fn decode_amounts_result(result: &str) -> Result<u128> {
    let trimmed = result.trim();
    let data = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let word = |index: usize| -> Result<&str> {
        data.get(index * 64..(index + 1) * 64)
            .ok_or_else(|| AppError::BlockchainRPC("eth_call result truncated".to_string()))
    };

    let length = parse_word_u128(word(1)?)? as usize;
    if length == 0 {
        return Err(AppError::BlockchainRPC(
            "getAmountsOut returned an empty path".to_string(),
        ));
    }
    parse_word_u128(word(1 + length)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TOKEN_EURC, TOKEN_USDC};

    fn offline_service() -> QuoteService {
        let mut rates = HashMap::new();
        rates.insert("USDC".to_string(), Decimal::from_str("0.085165").unwrap());
        rates.insert("EURC".to_string(), Decimal::from_str("11.7419").unwrap());
        QuoteService::new(String::new(), String::new(), 4, rates)
    }

    fn usdc() -> TokenDescriptor {
        TokenDescriptor {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            icon: "$".to_string(),
            address: TOKEN_USDC.to_string(),
            decimals: 6,
            is_native: false,
        }
    }

    fn eurc() -> TokenDescriptor {
        TokenDescriptor {
            symbol: "EURC".to_string(),
            name: "Euro Coin".to_string(),
            icon: "€".to_string(),
            address: TOKEN_EURC.to_string(),
            decimals: 6,
            is_native: false,
        }
    }

    #[tokio::test]
    async fn fallback_applies_source_keyed_rate() {
        // Ensures 100 USDC estimates to 8.5165 EURC without a live pool
        let service = offline_service();
        let quote = service
            .quote(&Decimal::from(100), &usdc(), &eurc())
            .await
            .unwrap();
        assert_eq!(format_amount(&quote.amount_out), "8.5165");
        assert_eq!(quote.source, QuoteSource::Fallback);
    }

    #[tokio::test]
    async fn fallback_rates_are_not_reciprocal() {
        // Ensures the reverse direction uses its own configured rate
        let service = offline_service();
        let quote = service
            .quote(&Decimal::from(100), &eurc(), &usdc())
            .await
            .unwrap();
        assert_eq!(format_amount(&quote.amount_out), "1174.19");
    }

    #[tokio::test]
    async fn fallback_rounds_to_token_precision() {
        // Ensures output is clipped to the destination token's decimals
        let service = offline_service();
        let amount = Decimal::from_str("0.0001").unwrap();
        let quote = service.quote(&amount, &usdc(), &eurc()).await.unwrap();
        // 0.0001 * 0.085165 = 0.0000085165 -> 0.000009 at 6 decimals
        assert_eq!(format_amount(&quote.amount_out), "0.000009");
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        // Ensures the service refuses non-positive input amounts
        let service = offline_service();
        let result = service.quote(&Decimal::ZERO, &usdc(), &eurc()).await;
        assert!(result.is_err());
    }

    #[test]
    fn encode_call_data_lays_out_path() {
        // Ensures selector, amount and both addresses land in the call data
        let data = encode_get_amounts_out(1_000_000, TOKEN_USDC, TOKEN_EURC).unwrap();
        assert!(data.starts_with("0xd06ca61f"));
        assert_eq!(data.len(), 2 + 8 + 64 * 5);
        assert!(data.contains("00000000000000000000000000000000000000000000000000000000000f4240"));
        assert!(data.contains(&format!(
            "{:0>64}",
            TOKEN_EURC.trim_start_matches("0x").to_ascii_lowercase()
        )));
    }

    #[test]
    fn decode_takes_last_path_amount() {
        // Ensures the second element of a two-hop result is returned
        let mut result = String::from("0x");
        result.push_str(&format!("{:064x}", 0x20));
        result.push_str(&format!("{:064x}", 2));
        result.push_str(&format!("{:064x}", 1_000_000u64));
        result.push_str(&format!("{:064x}", 8_516_500u64));
        assert_eq!(decode_amounts_result(&result).unwrap(), 8_516_500);
    }

    #[test]
    fn decode_rejects_truncated_result() {
        // Ensures a short payload is an error, not a bogus amount
        let mut result = String::from("0x");
        result.push_str(&format!("{:064x}", 0x20));
        result.push_str(&format!("{:064x}", 2));
        assert!(decode_amounts_result(&result).is_err());
    }

    #[test]
    fn unknown_source_symbol_assumes_unit_rate() {
        // Ensures a symbol with no configured rate still yields a number
        let service = offline_service();
        assert_eq!(service.fallback_rate("DOGE"), Decimal::ONE);
    }

    #[test]
    fn base_unit_conversion_round_trips() {
        // Ensures decimal <-> base-unit conversion agrees at 6 decimals
        let amount = Decimal::from_str("12.5").unwrap();
        let units = to_base_units(&amount, 6).unwrap();
        assert_eq!(units, 12_500_000);
        assert_eq!(from_base_units(units, 6), amount);
    }
}
