use crate::config::Config;
use crate::constants::{HISTORY_WINDOW, POOL_DECIMALS};
use crate::error::{AppError, Result};
use crate::models::{
    ConversationContext, Intent, Message, SwapAction, SwapChatRequest, SwapChatResponse,
    TokenDescriptor, TxStatus,
};
use crate::services::intent::{build_strategy_chain, IntentStrategy, ParseTurn};
use crate::services::quote_service::{format_amount, QuoteService};
use crate::services::token_registry::TokenRegistry;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

const STATUS_CANCELLED_RESPONSE: &str = "You rejected the transaction in your wallet. \
No harm done — the swap is off the table. Want to set it up again?";

const STATUS_INSUFFICIENT_RESPONSE: &str = "Your balance can't cover that swap. \
Even I can't conjure tokens you don't have. Grab some from the faucet and come back.";

const STATUS_ERROR_RESPONSE: &str = "The transaction failed on-chain. \
Even Infinity hiccups on a testnet. Give it another shot in a moment.";

/// Where a conversation stands. There is no terminal state; the machine is a
/// persistent per-session loop starting at idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    AwaitingConfirmation,
}

impl DialogueState {
    fn of(request: &SwapChatRequest) -> Self {
        if request.pending_swap.is_some() {
            DialogueState::AwaitingConfirmation
        } else {
            DialogueState::Idle
        }
    }
}

/// Drives one turn of the swap conversation: synthetic status short-circuit,
/// then the parser chain, then reconciliation against the state machine so
/// the hosted-model path and the rule-based path behave identically at the
/// protocol level. The controller itself is stateless; pending swap and
/// context live with the caller and are threaded through every call.
pub struct DialogueController {
    strategies: Vec<Box<dyn IntentStrategy>>,
    quotes: Arc<QuoteService>,
    registry: TokenRegistry,
}

impl DialogueController {
    pub fn new(config: &Config, quotes: Arc<QuoteService>) -> Self {
        Self {
            strategies: build_strategy_chain(config, quotes.clone()),
            quotes,
            registry: TokenRegistry::arc_testnet(),
        }
    }

    pub async fn handle(&self, request: SwapChatRequest) -> Result<SwapChatResponse> {
        // Execution feedback wins over text parsing and leaves pending swap
        // and context alone.
        if let Some(status) = request.status {
            tracing::info!("dialogue turn: synthetic status {:?}", status);
            return Ok(status_reply(status, request.context));
        }

        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .ok_or_else(|| AppError::BadRequest("message or status is required".to_string()))?;

        let tokens: Vec<TokenDescriptor> = match &request.tokens {
            Some(tokens) if !tokens.is_empty() => tokens.clone(),
            _ => self.registry.tokens().to_vec(),
        };
        let history = tail(&request.history, HISTORY_WINDOW);
        let state = DialogueState::of(&request);

        let turn = ParseTurn {
            message,
            tokens: &tokens,
            history,
            pending_swap: request.pending_swap.as_ref(),
            context: request.context.as_ref(),
        };

        let mut parsed = None;
        for strategy in &self.strategies {
            match strategy.parse(&turn).await {
                Ok(intent) => {
                    tracing::debug!("intent parsed by '{}' strategy", strategy.name());
                    parsed = Some(intent);
                    break;
                }
                Err(err) => {
                    tracing::warn!(
                        "intent strategy '{}' failed, trying next: {}",
                        strategy.name(),
                        err
                    );
                }
            }
        }
        let intent = parsed
            .ok_or_else(|| AppError::Internal("no intent strategy produced a result".to_string()))?;

        let intent = self.reconcile(intent, &turn).await;
        tracing::info!(
            "dialogue turn: state={:?} action={:?}",
            state,
            intent.action
        );
        Ok(compose_response(intent, request.context))
    }

    /// Holds every strategy to the same state machine. The rule-based parser
    /// already conforms; hosted-model output is clamped here.
    async fn reconcile(&self, mut intent: Intent, turn: &ParseTurn<'_>) -> Intent {
        match (intent.action, turn.pending_swap) {
            // Confirmation or cancellation without anything pending is noise.
            (SwapAction::ExecuteSwap | SwapAction::CancelSwap, None) => {
                intent.action = SwapAction::Chat;
                intent.from_token = None;
                intent.to_token = None;
                intent.amount = None;
            }
            // A pending trade's parameters are never silently altered.
            (
                SwapAction::ExecuteSwap | SwapAction::CancelSwap | SwapAction::ProposeSwap,
                Some(pending),
            ) => {
                intent.from_token = Some(pending.from_token.clone());
                intent.to_token = Some(pending.to_token.clone());
                intent.amount = Some(pending.amount.clone());
            }
            (SwapAction::ProposeSwap, None) => {
                // A proposal needs a full trade; otherwise it is a
                // clarification turn.
                let complete = intent.from_token.is_some()
                    && intent.to_token.is_some()
                    && intent
                        .amount
                        .as_deref()
                        .and_then(|amount| Decimal::from_str(amount).ok())
                        .map(|amount| amount > Decimal::ZERO)
                        .unwrap_or(false);
                if !complete {
                    intent.action = SwapAction::Chat;
                    intent.amount = None;
                    intent.estimated_amount = None;
                }
            }
            (SwapAction::Chat, _) => {}
        }

        if intent.action == SwapAction::ProposeSwap && intent.estimated_amount.is_none() {
            intent.estimated_amount = self.estimate_for(&intent, turn.tokens).await;
        }
        intent
    }

    async fn estimate_for(
        &self,
        intent: &Intent,
        tokens: &[TokenDescriptor],
    ) -> Option<String> {
        let from_symbol = intent.from_token.as_deref()?;
        let to_symbol = intent.to_token.as_deref()?;
        let amount = Decimal::from_str(intent.amount.as_deref()?).ok()?;
        let from = descriptor_or_default(tokens, from_symbol);
        let to = descriptor_or_default(tokens, to_symbol);
        match self.quotes.quote(&amount, &from, &to).await {
            Ok(quote) => Some(format_amount(&quote.amount_out)),
            Err(err) => {
                tracing::warn!("estimate for proposal unavailable: {}", err);
                None
            }
        }
    }
}

fn descriptor_or_default(tokens: &[TokenDescriptor], symbol: &str) -> TokenDescriptor {
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

fn tail(history: &[Message], window: usize) -> &[Message] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

fn status_reply(status: TxStatus, context: Option<ConversationContext>) -> SwapChatResponse {
    let response = match status {
        TxStatus::TransactionCancelled => STATUS_CANCELLED_RESPONSE,
        TxStatus::InsufficientFunds => STATUS_INSUFFICIENT_RESPONSE,
        TxStatus::TransactionError => STATUS_ERROR_RESPONSE,
    };
    SwapChatResponse {
        action: SwapAction::Chat,
        from_token: None,
        to_token: None,
        amount: None,
        estimated_amount: None,
        response: response.to_string(),
        context,
    }
}

fn compose_response(
    intent: Intent,
    input_context: Option<ConversationContext>,
) -> SwapChatResponse {
    // Prefer the pair the parser inferred this turn; derive one from a full
    // proposal; otherwise carry the caller's context through untouched.
    let context = intent
        .context
        .or_else(|| match (&intent.from_token, &intent.to_token) {
            (Some(from), Some(to)) => Some(ConversationContext::pair(from, to)),
            _ => input_context.clone(),
        })
        .or(input_context);

    SwapChatResponse {
        action: intent.action,
        from_token: intent.from_token,
        to_token: intent.to_token,
        amount: intent.amount,
        estimated_amount: intent.estimated_amount,
        response: intent.response,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::{PendingSwap, Role};

    fn controller() -> DialogueController {
        let config = test_config();
        let quotes = Arc::new(QuoteService::from_config(&config));
        DialogueController::new(&config, quotes)
    }

    fn request(message: &str) -> SwapChatRequest {
        SwapChatRequest {
            message: Some(message.to_string()),
            status: None,
            tokens: None,
            history: Vec::new(),
            pending_swap: None,
            context: None,
        }
    }

    #[tokio::test]
    async fn propose_then_execute_round_trips_fields() {
        // Ensures the proposed trade reappears unchanged at confirmation
        let controller = controller();
        let proposal = controller
            .handle(request("swap 100 USDC for EURC"))
            .await
            .unwrap();
        assert_eq!(proposal.action, SwapAction::ProposeSwap);
        assert_eq!(proposal.estimated_amount.as_deref(), Some("8.5165"));

        let mut confirm = request("yes");
        confirm.pending_swap = Some(PendingSwap {
            from_token: proposal.from_token.clone().unwrap(),
            to_token: proposal.to_token.clone().unwrap(),
            amount: proposal.amount.clone().unwrap(),
        });
        confirm.context = proposal.context.clone();
        let executed = controller.handle(confirm).await.unwrap();
        assert_eq!(executed.action, SwapAction::ExecuteSwap);
        assert_eq!(executed.from_token, proposal.from_token);
        assert_eq!(executed.to_token, proposal.to_token);
        assert_eq!(executed.amount, proposal.amount);
    }

    #[tokio::test]
    async fn status_reply_keeps_context_untouched() {
        // Ensures synthetic statuses answer without disturbing session state
        let controller = controller();
        let context = ConversationContext::pair("USDC", "EURC");
        let mut req = request("ignored");
        req.message = None;
        req.status = Some(TxStatus::InsufficientFunds);
        req.context = Some(context.clone());
        let response = controller.handle(req).await.unwrap();
        assert_eq!(response.action, SwapAction::Chat);
        assert_eq!(response.response, STATUS_INSUFFICIENT_RESPONSE);
        assert_eq!(response.context, Some(context));
        assert!(response.from_token.is_none());
    }

    #[tokio::test]
    async fn each_status_has_its_own_explanation() {
        // Ensures the three failure categories do not share a message
        let controller = controller();
        let mut replies = Vec::new();
        for status in [
            TxStatus::TransactionCancelled,
            TxStatus::InsufficientFunds,
            TxStatus::TransactionError,
        ] {
            let mut req = request("ignored");
            req.message = None;
            req.status = Some(status);
            replies.push(controller.handle(req).await.unwrap().response);
        }
        assert_ne!(replies[0], replies[1]);
        assert_ne!(replies[1], replies[2]);
        assert_ne!(replies[0], replies[2]);
    }

    #[tokio::test]
    async fn missing_message_and_status_is_bad_request() {
        // Ensures an empty turn is a caller error, not a crash
        let controller = controller();
        let mut req = request("   ");
        req.status = None;
        let result = controller.handle(req).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn execute_without_pending_downgrades_to_chat() {
        // Ensures a stray confirmation cannot trigger an execution
        let controller = controller();
        let intent = Intent {
            action: SwapAction::ExecuteSwap,
            from_token: Some("USDC".to_string()),
            to_token: Some("EURC".to_string()),
            amount: Some("100".to_string()),
            estimated_amount: None,
            response: "On it.".to_string(),
            context: None,
        };
        let tokens = TokenRegistry::arc_testnet().tokens().to_vec();
        let turn = ParseTurn {
            message: "yes",
            tokens: &tokens,
            history: &[],
            pending_swap: None,
            context: None,
        };
        let reconciled = controller.reconcile(intent, &turn).await;
        assert_eq!(reconciled.action, SwapAction::Chat);
        assert!(reconciled.from_token.is_none());
        assert!(reconciled.amount.is_none());
    }

    #[tokio::test]
    async fn incomplete_model_proposal_becomes_clarification() {
        // Ensures a proposal without a usable amount cannot reach the caller
        let controller = controller();
        let intent = Intent {
            action: SwapAction::ProposeSwap,
            from_token: Some("USDC".to_string()),
            to_token: Some("EURC".to_string()),
            amount: Some("a lot".to_string()),
            estimated_amount: None,
            response: "How much are we moving?".to_string(),
            context: None,
        };
        let tokens = TokenRegistry::arc_testnet().tokens().to_vec();
        let turn = ParseTurn {
            message: "swap usdc",
            tokens: &tokens,
            history: &[],
            pending_swap: None,
            context: None,
        };
        let reconciled = controller.reconcile(intent, &turn).await;
        assert_eq!(reconciled.action, SwapAction::Chat);
        assert!(reconciled.amount.is_none());
    }

    #[tokio::test]
    async fn model_proposal_gets_estimate_filled() {
        // Ensures reconciliation quotes proposals the model left unpriced
        let controller = controller();
        let intent = Intent {
            action: SwapAction::ProposeSwap,
            from_token: Some("USDC".to_string()),
            to_token: Some("EURC".to_string()),
            amount: Some("100".to_string()),
            estimated_amount: None,
            response: "Set.".to_string(),
            context: None,
        };
        let tokens = TokenRegistry::arc_testnet().tokens().to_vec();
        let turn = ParseTurn {
            message: "swap 100 usdc for eurc",
            tokens: &tokens,
            history: &[],
            pending_swap: None,
            context: None,
        };
        let reconciled = controller.reconcile(intent, &turn).await;
        assert_eq!(reconciled.estimated_amount.as_deref(), Some("8.5165"));
    }

    #[test]
    fn history_tail_keeps_most_recent_window() {
        // Ensures only the five most recent turns reach the parsers
        let history: Vec<Message> = (0..8)
            .map(|index| Message {
                role: Role::User,
                content: format!("message {}", index),
            })
            .collect();
        let window = tail(&history, HISTORY_WINDOW);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].content, "message 3");
        assert_eq!(window[4].content, "message 7");
    }

    #[test]
    fn compose_prefers_parser_context() {
        // Ensures the freshly inferred pair beats the carried-over one
        let intent = Intent {
            action: SwapAction::Chat,
            from_token: None,
            to_token: None,
            amount: None,
            estimated_amount: None,
            response: "hi".to_string(),
            context: Some(ConversationContext::pair("EURC", "USDC")),
        };
        let old = ConversationContext::pair("USDC", "EURC");
        let response = compose_response(intent, Some(old));
        assert_eq!(
            response.context,
            Some(ConversationContext::pair("EURC", "USDC"))
        );
    }
}
