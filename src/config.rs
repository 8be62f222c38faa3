use crate::constants::{
    CONTRACT_SWAP_ROUTER, DEFAULT_EURC_USDC_RATE, DEFAULT_GROQ_API_URL, DEFAULT_GROQ_MODEL,
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_OPENAI_API_URL, DEFAULT_OPENAI_MODEL,
    DEFAULT_QUOTE_TIMEOUT_SECS, DEFAULT_USDC_EURC_RATE,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Arc testnet
    pub arc_rpc_url: String,
    pub swap_router_address: String,

    // LLM providers (both optional; the rule-based parser is the floor)
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub groq_model: String,
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,

    // Approximate rates used when the live pool quote fails, keyed by source symbol
    pub usdc_eurc_rate: String,
    pub eurc_usdc_rate: String,

    // Timeouts
    pub quote_timeout_secs: u64,
    pub llm_timeout_secs: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            arc_rpc_url: env::var("ARC_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.testnet.arc.network".to_string()),
            swap_router_address: env::var("SWAP_ROUTER_ADDRESS")
                .unwrap_or_else(|_| CONTRACT_SWAP_ROUTER.to_string()),

            groq_api_key: env::var("GROQ_API_KEY").ok(),
            groq_api_url: env::var("GROQ_API_URL")
                .unwrap_or_else(|_| DEFAULT_GROQ_API_URL.to_string()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),

            usdc_eurc_rate: env::var("USDC_EURC_RATE")
                .unwrap_or_else(|_| DEFAULT_USDC_EURC_RATE.to_string()),
            eurc_usdc_rate: env::var("EURC_USDC_RATE")
                .unwrap_or_else(|_| DEFAULT_EURC_USDC_RATE.to_string()),

            quote_timeout_secs: env::var("QUOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_QUOTE_TIMEOUT_SECS),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if Decimal::from_str(self.usdc_eurc_rate.trim()).is_err() {
            anyhow::bail!("USDC_EURC_RATE is not a decimal number");
        }
        if Decimal::from_str(self.eurc_usdc_rate.trim()).is_err() {
            anyhow::bail!("EURC_USDC_RATE is not a decimal number");
        }

        if self.arc_rpc_url.trim().is_empty() {
            tracing::warn!("ARC_RPC_URL is empty; every quote will use the approximate rate");
        }
        if self.swap_router_address.trim().is_empty()
            || self.swap_router_address.starts_with("0x0000")
        {
            tracing::warn!("Using placeholder swap router address");
        }
        if !self.has_llm_provider() {
            tracing::warn!("No LLM provider configured; swap assistant runs rule-based only");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn has_llm_provider(&self) -> bool {
        let configured = |key: &Option<String>| {
            key.as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
        };
        configured(&self.groq_api_key) || configured(&self.openai_api_key)
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development" || self.environment == "testnet"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        arc_rpc_url: String::new(),
        swap_router_address: CONTRACT_SWAP_ROUTER.to_string(),
        groq_api_key: None,
        groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
        groq_model: DEFAULT_GROQ_MODEL.to_string(),
        openai_api_key: None,
        openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
        openai_model: DEFAULT_OPENAI_MODEL.to_string(),
        usdc_eurc_rate: DEFAULT_USDC_EURC_RATE.to_string(),
        eurc_usdc_rate: DEFAULT_EURC_USDC_RATE.to_string(),
        quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
        llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_default_rates() {
        // Ensures the shipped fallback rates pass validation
        let config = test_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_rate() {
        // Ensures a non-numeric rate is refused at startup
        let mut config = test_config();
        config.usdc_eurc_rate = "not-a-number".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn has_llm_provider_requires_non_empty_key() {
        // Ensures a blank key does not count as a configured provider
        let mut config = test_config();
        assert!(!config.has_llm_provider());
        config.groq_api_key = Some("   ".to_string());
        assert!(!config.has_llm_provider());
        config.groq_api_key = Some("gsk_test".to_string());
        assert!(config.has_llm_provider());
    }
}
