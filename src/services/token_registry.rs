use crate::constants::{TOKEN_EURC, TOKEN_USDC};
use crate::models::TokenDescriptor;

/// Fixed, ordered set of tradable assets. No mutation operations; lookups
/// are case-sensitive exact matches on the symbol.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    /// The Arc testnet pair the swap UI trades.
    pub fn arc_testnet() -> Self {
        Self {
            tokens: vec![
                TokenDescriptor {
                    symbol: "USDC".to_string(),
                    name: "USD Coin".to_string(),
                    icon: "$".to_string(),
                    address: TOKEN_USDC.to_string(),
                    decimals: 6,
                    is_native: false,
                },
                TokenDescriptor {
                    symbol: "EURC".to_string(),
                    name: "Euro Coin".to_string(),
                    icon: "€".to_string(),
                    address: TOKEN_EURC.to_string(),
                    decimals: 6,
                    is_native: false,
                },
            ],
        }
    }

    pub fn tokens(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    pub fn get(&self, symbol: &str) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        // Ensures "usdc" does not resolve; the wire protocol uses exact symbols
        let registry = TokenRegistry::arc_testnet();
        assert!(registry.get("USDC").is_some());
        assert!(registry.get("usdc").is_none());
        assert!(registry.get("DOGE").is_none());
    }

    #[test]
    fn default_registry_preserves_order() {
        // Ensures USDC stays first; the default pair depends on it
        let registry = TokenRegistry::arc_testnet();
        let symbols: Vec<&str> = registry.tokens().iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["USDC", "EURC"]);
    }

    #[test]
    fn descriptors_carry_pool_precision() {
        // Ensures both pool tokens settle at 6 decimals
        let registry = TokenRegistry::arc_testnet();
        assert!(registry.tokens().iter().all(|t| t.decimals == 6));
    }
}
