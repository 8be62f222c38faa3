use serde::{Deserialize, Serialize};

/// A tradable asset. Immutable, defined at startup (or supplied per request
/// by the caller, which takes precedence).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub address: String,
    pub decimals: u32,
    #[serde(default)]
    pub is_native: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// A proposed-but-unconfirmed trade. At most one exists per conversation;
/// the caller clears it on EXECUTE_SWAP, CANCEL_SWAP, or a failed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSwap {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
}

/// The last token pair inferred from the dialogue, carried across turns so
/// a bare amount in a follow-up message can resolve against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_token: Option<String>,
}

impl ConversationContext {
    pub fn pair(from: &str, to: &str) -> Self {
        Self {
            from_token: Some(from.to_string()),
            to_token: Some(to.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapAction {
    Chat,
    ProposeSwap,
    ExecuteSwap,
    CancelSwap,
}

/// Synthetic statuses the caller feeds back after an execution attempt,
/// recognized ahead of normal text parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    TransactionCancelled,
    InsufficientFunds,
    TransactionError,
}

/// A parser strategy's output for one turn. Transient; not persisted beyond
/// the request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: SwapAction,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
    pub estimated_amount: Option<String>,
    pub response: String,
    /// Pair the parser inferred this turn; `None` leaves the caller's
    /// context untouched.
    pub context: Option<ConversationContext>,
}

impl Intent {
    pub fn chat(response: impl Into<String>) -> Self {
        Self {
            action: SwapAction::Chat,
            from_token: None,
            to_token: None,
            amount: None,
            estimated_amount: None,
            response: response.into(),
            context: None,
        }
    }
}

// ==================== WIRE TYPES ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<TxStatus>,
    #[serde(default)]
    pub tokens: Option<Vec<TokenDescriptor>>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub pending_swap: Option<PendingSwap>,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapChatResponse {
    pub action: SwapAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_amount: Option<String>,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteResponse {
    pub from_amount: String,
    pub to_amount: String,
    pub rate: String,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_action_uses_screaming_snake_case() {
        // Ensures the wire action strings match the observed protocol
        assert_eq!(
            serde_json::to_string(&SwapAction::ProposeSwap).unwrap(),
            "\"PROPOSE_SWAP\""
        );
        assert_eq!(serde_json::to_string(&SwapAction::Chat).unwrap(), "\"CHAT\"");
    }

    #[test]
    fn tx_status_parses_known_values_only() {
        // Ensures the three synthetic statuses round-trip and others fail
        let status: TxStatus = serde_json::from_str("\"INSUFFICIENT_FUNDS\"").unwrap();
        assert_eq!(status, TxStatus::InsufficientFunds);
        assert!(serde_json::from_str::<TxStatus>("\"SOMETHING_ELSE\"").is_err());
    }

    #[test]
    fn chat_request_accepts_camel_case_fields() {
        // Ensures pendingSwap and context deserialize from the UI payload
        let body = r#"{
            "message": "yes",
            "history": [{"role": "user", "content": "swap 1 USDC for EURC"}],
            "pendingSwap": {"fromToken": "USDC", "toToken": "EURC", "amount": "1"},
            "context": {"fromToken": "USDC", "toToken": "EURC"}
        }"#;
        let req: SwapChatRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.pending_swap.unwrap().from_token, "USDC");
        assert_eq!(req.context.unwrap().to_token.as_deref(), Some("EURC"));
        assert_eq!(req.history.len(), 1);
    }

    #[test]
    fn chat_response_omits_empty_fields() {
        // Ensures pure-chat responses stay lean on the wire
        let response = SwapChatResponse {
            action: SwapAction::Chat,
            from_token: None,
            to_token: None,
            amount: None,
            estimated_amount: None,
            response: "hello".to_string(),
            context: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"action":"CHAT","response":"hello"}"#);
    }
}
