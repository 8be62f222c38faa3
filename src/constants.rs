/// Application constants

pub const API_VERSION: &str = "v1";

// Token addresses (Arc testnet)
pub const TOKEN_USDC: &str = "0x3600000000000000000000000000000000000000";
pub const TOKEN_EURC: &str = "0x89B50855Aa3bE2F677cD6303Cec089B5F319D72a";

// Contract addresses
pub const CONTRACT_SWAP_ROUTER: &str = "0x284C5Afc100ad14a458255075324fA0A9dfd66b1";
pub const CONTRACT_LIQUIDITY_POOL: &str = "0x18eAE2e870Ec4Bc31a41B12773c4F5c40Bf19aCD";

// Both testnet pool tokens settle at 6 decimals
pub const POOL_DECIMALS: u32 = 6;

// Approximate exchange rates used when the live pool quote is unavailable.
// Keyed by source symbol and intentionally not reciprocal (testnet spread).
pub const DEFAULT_USDC_EURC_RATE: &str = "0.085165";
pub const DEFAULT_EURC_USDC_RATE: &str = "11.7419";

// Dialogue configuration
pub const HISTORY_WINDOW: usize = 5;
pub const DEFAULT_FROM_SYMBOL: &str = "USDC";
pub const DEFAULT_TO_SYMBOL: &str = "EURC";

// Default provider endpoints and models
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

// Timeouts
pub const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 12;
