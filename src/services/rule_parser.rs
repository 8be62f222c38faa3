//! Deterministic rule-based intent parser, used when no hosted model is
//! configured or every provider failed. Given identical inputs it returns
//! identical output. The string matching is deliberately naive substring
//! work; the hosted model is the primary path and this one is the testable
//! floor, so its quirks stay as they are.

use crate::constants::{DEFAULT_FROM_SYMBOL, DEFAULT_TO_SYMBOL, POOL_DECIMALS};
use crate::error::Result;
use crate::models::{
    ConversationContext, Intent, PendingSwap, SwapAction, TokenDescriptor,
};
use crate::services::intent::{IntentStrategy, ParseTurn};
use crate::services::quote_service::{format_amount, QuoteService};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

const SENSITIVE_KEYWORDS: &[&str] = &[
    "private key",
    "seed phrase",
    "secret phrase",
    "recovery phrase",
    "mnemonic",
    "password",
    "chave privada",
    "frase secreta",
    "frase de recupera",
    "senha",
];

// Plain substrings on purpose; "to" inside another word counts.
const DIRECTIONAL_KEYWORDS: &[&str] = &["for", "to", "por", "para"];

const SWAP_KEYWORDS: &[&str] = &["swap", "trocar", "exchange"];

const AFFIRMATIVE_KEYWORDS: &[&str] = &[
    "yes", "yeah", "yep", "confirm", "go ahead", "do it", "sim", "pode", "confirmo", "bora", "ok",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "no", "nope", "cancel", "stop", "forget", "nao", "não", "cancela", "deixa",
];

const REFUSAL_RESPONSE: &str = "Nice try. Even blindfolded I can see where that's going. \
I never touch private keys, seed phrases, or passwords — and you should never share them with anyone. \
Now, want to swap something instead?";

const CAPABILITIES_RESPONSE: &str = "I'm the strongest swap assistant on the Arc testnet. \
Tell me something like \"swap 100 USDC for EURC\" and consider it done.";

const NETWORK_RESPONSE: &str = "Arc is a testnet built for stablecoin FX. Blocks settle fast, \
fees are pocket change, and USDC pays the gas. A playground worthy of me, barely.";

const FEES_RESPONSE: &str = "Swaps route through the testnet pool with a 0.3% pool fee, \
and gas is paid in USDC. Practically free — even for mortals.";

const GRATITUDE_RESPONSE: &str = "Of course. I'm the strongest — it was nothing.";

/// Finite decision procedure over the lowercased message text. Closes the
/// strategy chain and never fails.
pub struct RuleBasedStrategy {
    quotes: Arc<QuoteService>,
}

impl RuleBasedStrategy {
    pub fn new(quotes: Arc<QuoteService>) -> Self {
        Self { quotes }
    }

    fn confirmation_reply(&self, pending: &PendingSwap, text: &str) -> Intent {
        let pair = ConversationContext::pair(&pending.from_token, &pending.to_token);
        if contains_any(text, AFFIRMATIVE_KEYWORDS) {
            Intent {
                action: SwapAction::ExecuteSwap,
                from_token: Some(pending.from_token.clone()),
                to_token: Some(pending.to_token.clone()),
                amount: Some(pending.amount.clone()),
                estimated_amount: None,
                response: format!(
                    "Executing: {} {} into {}. Watch closely — this is what peak performance looks like.",
                    pending.amount, pending.from_token, pending.to_token
                ),
                context: Some(pair),
            }
        } else if contains_any(text, NEGATIVE_KEYWORDS) {
            Intent {
                action: SwapAction::CancelSwap,
                from_token: Some(pending.from_token.clone()),
                to_token: Some(pending.to_token.clone()),
                amount: Some(pending.amount.clone()),
                estimated_amount: None,
                response: "Swap cancelled. Infinity stays untouched. Come back when you're ready."
                    .to_string(),
                context: Some(pair),
            }
        } else {
            // State does not advance on an unrecognized reply; the pending
            // fields are re-emitted unchanged.
            Intent {
                action: SwapAction::ProposeSwap,
                from_token: Some(pending.from_token.clone()),
                to_token: Some(pending.to_token.clone()),
                amount: Some(pending.amount.clone()),
                estimated_amount: None,
                response: format!(
                    "A simple yes or no will do. Swap {} {} for {}?",
                    pending.amount, pending.from_token, pending.to_token
                ),
                context: Some(pair),
            }
        }
    }

    async fn proposal(
        &self,
        turn: &ParseTurn<'_>,
        from_symbol: &str,
        to_symbol: &str,
        amount: &str,
    ) -> Intent {
        let from = descriptor_for(turn.tokens, from_symbol);
        let to = descriptor_for(turn.tokens, to_symbol);
        let estimate = match Decimal::from_str(amount) {
            Ok(amount_in) if !amount_in.is_zero() => {
                match self.quotes.quote(&amount_in, &from, &to).await {
                    Ok(quote) => Some(format_amount(&quote.amount_out)),
                    Err(_) => None,
                }
            }
            _ => None,
        };

        let response = match &estimate {
            Some(estimated) => format!(
                "You want to swap {} {} for roughly {} {}? Say the word and it's done. I'm the strongest, after all.",
                amount, from_symbol, estimated, to_symbol
            ),
            None => format!(
                "You want to swap {} {} for {}? Say the word and it's done. I'm the strongest, after all.",
                amount, from_symbol, to_symbol
            ),
        };

        Intent {
            action: SwapAction::ProposeSwap,
            from_token: Some(from_symbol.to_string()),
            to_token: Some(to_symbol.to_string()),
            amount: Some(amount.to_string()),
            estimated_amount: estimate,
            response,
            context: Some(ConversationContext::pair(from_symbol, to_symbol)),
        }
    }
}

#[async_trait]
impl IntentStrategy for RuleBasedStrategy {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn parse(&self, turn: &ParseTurn<'_>) -> Result<Intent> {
        let text = turn.message.to_lowercase();

        // Safety filter runs first and preempts everything, pending swap
        // included.
        if contains_any(&text, SENSITIVE_KEYWORDS) {
            return Ok(Intent::chat(REFUSAL_RESPONSE));
        }

        if let Some(pending) = turn.pending_swap {
            return Ok(self.confirmation_reply(pending, &text));
        }

        let mentioned = mentioned_symbols(&text, turn.tokens);
        let (from_symbol, to_symbol) = resolve_pair(&text, &mentioned, turn.tokens, turn.context);
        let pair = ConversationContext::pair(&from_symbol, &to_symbol);
        let amount = extract_amount(&text);

        let has_swap_intent = !mentioned.is_empty()
            || contains_any(&text, SWAP_KEYWORDS)
            || text.chars().any(|c| c.is_ascii_digit());

        if !has_swap_intent {
            let mut intent = Intent::chat(knowledge_base_reply(&text));
            intent.context = Some(pair);
            return Ok(intent);
        }

        match amount {
            Some(amount) => Ok(self.proposal(turn, &from_symbol, &to_symbol, &amount).await),
            None => Ok(Intent {
                action: SwapAction::Chat,
                from_token: None,
                to_token: None,
                amount: None,
                estimated_amount: None,
                response: format!(
                    "How much {} do you want to turn into {}? Give me a number and it's as good as done.",
                    from_symbol, to_symbol
                ),
                context: Some(pair),
            }),
        }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Known symbols present in the text, ordered by first appearance.
fn mentioned_symbols(text: &str, tokens: &[TokenDescriptor]) -> Vec<(usize, String)> {
    let mut found: Vec<(usize, String)> = tokens
        .iter()
        .filter_map(|token| {
            text.find(&token.symbol.to_lowercase())
                .map(|position| (position, token.symbol.clone()))
        })
        .collect();
    found.sort_by_key(|(position, _)| *position);
    found
}

fn resolve_pair(
    text: &str,
    mentioned: &[(usize, String)],
    tokens: &[TokenDescriptor],
    context: Option<&ConversationContext>,
) -> (String, String) {
    match mentioned {
        [first, second, ..] => (first.1.clone(), second.1.clone()),
        [only] => {
            let symbol = only.1.clone();
            let counterpart = counterpart_for(&symbol, tokens, context);
            // A directional preposition marks the mentioned token as the
            // destination; without one it is the source.
            if contains_any(text, DIRECTIONAL_KEYWORDS) {
                (counterpart, symbol)
            } else {
                (symbol, counterpart)
            }
        }
        [] => context_or_default_pair(tokens, context),
    }
}

fn counterpart_for(
    symbol: &str,
    tokens: &[TokenDescriptor],
    context: Option<&ConversationContext>,
) -> String {
    if let Some(context) = context {
        for candidate in [context.from_token.as_deref(), context.to_token.as_deref()]
            .into_iter()
            .flatten()
        {
            if candidate != symbol {
                return candidate.to_string();
            }
        }
    }
    tokens
        .iter()
        .map(|token| token.symbol.as_str())
        .find(|candidate| *candidate != symbol)
        .unwrap_or(if symbol == DEFAULT_FROM_SYMBOL {
            DEFAULT_TO_SYMBOL
        } else {
            DEFAULT_FROM_SYMBOL
        })
        .to_string()
}

fn context_or_default_pair(
    tokens: &[TokenDescriptor],
    context: Option<&ConversationContext>,
) -> (String, String) {
    if let Some(context) = context {
        if let (Some(from), Some(to)) = (context.from_token.as_deref(), context.to_token.as_deref())
        {
            if from != to {
                return (from.to_string(), to.to_string());
            }
        }
    }
    let mut symbols = tokens.iter().map(|token| token.symbol.as_str());
    let from = symbols.next().unwrap_or(DEFAULT_FROM_SYMBOL);
    let to = symbols.next().unwrap_or(DEFAULT_TO_SYMBOL);
    (from.to_string(), to.to_string())
}

/// First decimal number in the message, kept verbatim as a string.
fn extract_amount(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        if chars[index].is_ascii_digit() {
            let start = index;
            let mut seen_dot = false;
            while index < chars.len() {
                let c = chars[index];
                if c.is_ascii_digit() {
                    index += 1;
                } else if c == '.'
                    && !seen_dot
                    && index + 1 < chars.len()
                    && chars[index + 1].is_ascii_digit()
                {
                    seen_dot = true;
                    index += 1;
                } else {
                    break;
                }
            }
            return Some(chars[start..index].iter().collect());
        }
        index += 1;
    }
    None
}

fn knowledge_base_reply(text: &str) -> &'static str {
    if contains_any(text, &["thank", "thanks", "obrigado", "obrigada", "valeu"]) {
        GRATITUDE_RESPONSE
    } else if contains_any(text, &["fee", "fees", "taxa", "gas", "cost"]) {
        FEES_RESPONSE
    } else if contains_any(text, &["arc", "network", "rede", "chain", "testnet"]) {
        NETWORK_RESPONSE
    } else {
        CAPABILITIES_RESPONSE
    }
}

fn descriptor_for(tokens: &[TokenDescriptor], symbol: &str) -> TokenDescriptor {
    tokens
        .iter()
        .find(|token| token.symbol == symbol)
        .cloned()
        .unwrap_or_else(|| TokenDescriptor {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            icon: String::new(),
            address: String::new(),
            decimals: POOL_DECIMALS,
            is_native: false,
        })
}
