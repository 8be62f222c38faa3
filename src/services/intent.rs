use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    ConversationContext, Intent, Message, PendingSwap, SwapAction, TokenDescriptor,
};
use crate::services::quote_service::QuoteService;
use crate::services::rule_parser::RuleBasedStrategy;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One turn of the dialogue as a parser strategy sees it. History is already
/// truncated by the controller.
#[derive(Debug, Clone)]
pub struct ParseTurn<'a> {
    pub message: &'a str,
    pub tokens: &'a [TokenDescriptor],
    pub history: &'a [Message],
    pub pending_swap: Option<&'a PendingSwap>,
    pub context: Option<&'a ConversationContext>,
}

/// A way of turning a user message into an [`Intent`]. Strategies are tried
/// in order until one succeeds; the rule-based fallback closes the chain and
/// never fails.
#[async_trait]
pub trait IntentStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn parse(&self, turn: &ParseTurn<'_>) -> Result<Intent>;
}

/// Hosted-model strategy speaking the OpenAI-compatible chat-completions
/// protocol (Groq and OpenAI both do).
pub struct ChatCompletionStrategy {
    name: &'static str,
    api_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionStrategy {
    pub fn groq(config: &Config) -> Option<Self> {
        let api_key = config.groq_api_key.as_deref()?.trim().to_string();
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            name: "groq",
            api_url: config.groq_api_url.clone(),
            api_key,
            model: config.groq_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        })
    }

    pub fn openai(config: &Config) -> Option<Self> {
        let api_key = config.openai_api_key.as_deref()?.trim().to_string();
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            name: "openai",
            api_url: config.openai_api_url.clone(),
            api_key,
            model: config.openai_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        })
    }
}

#[async_trait]
impl IntentStrategy for ChatCompletionStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn parse(&self, turn: &ParseTurn<'_>) -> Result<Intent> {
        let url = Url::parse(&format!(
            "{}/chat/completions",
            self.api_url.trim_end_matches('/')
        ))
        .map_err(|e| AppError::ExternalAPI(format!("Invalid provider URL: {}", e)))?;

        let mut messages = Vec::with_capacity(turn.history.len() + 2);
        messages.push(json!({
            "role": "system",
            "content": build_system_prompt(turn),
        }));
        for message in turn.history {
            messages.push(json!({"role": message.role, "content": message.content}));
        }
        messages.push(json!({"role": "user", "content": turn.message}));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("LLM HTTP client init failed: {}", e)))?;

        let response = client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "response_format": {"type": "json_object"},
                "temperature": 0.2,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("{} request failed: {}", self.name, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalAPI(format!(
                "{} returned HTTP {}: {}",
                self.name, status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("{} response unreadable: {}", self.name, e)))?;
        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| {
                AppError::ExternalAPI(format!("{} returned no completion content", self.name))
            })?;

        parse_model_reply(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

/// The shape the model is instructed to return. Parsed strictly: anything
/// that does not fit is a provider failure, never coerced into an intent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    #[serde(default)]
    action: Option<SwapAction>,
    #[serde(default)]
    from_token: Option<String>,
    #[serde(default)]
    to_token: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

fn parse_model_reply(content: &str) -> Result<Intent> {
    let reply: ModelReply = serde_json::from_str(content.trim())
        .map_err(|e| AppError::ExternalAPI(format!("model reply is not valid JSON: {}", e)))?;
    let response = reply
        .response
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::ExternalAPI("model reply has no response text".to_string()))?;

    Ok(Intent {
        action: reply.action.unwrap_or(SwapAction::Chat),
        from_token: reply.from_token,
        to_token: reply.to_token,
        amount: reply.amount,
        estimated_amount: None,
        response,
        context: None,
    })
}

fn build_system_prompt(turn: &ParseTurn<'_>) -> String {
    let tokens = serde_json::to_string(turn.tokens).unwrap_or_else(|_| "[]".to_string());
    let pending = turn
        .pending_swap
        .and_then(|pending| serde_json::to_string(pending).ok())
        .unwrap_or_else(|| "null".to_string());
    let context = turn
        .context
        .and_then(|context| serde_json::to_string(context).ok())
        .unwrap_or_else(|| "null".to_string());

    format!(
        r#"You are Gojo Satoru, the strongest jujutsu sorcerer, now acting as an AI Swap Assistant.
Your personality is confident, playful, and slightly arrogant but deeply helpful.
You help users perform swaps on the Arc network.

The available tokens are: {tokens}.
Pending swap awaiting confirmation: {pending}.
Conversation context (last known token pair): {context}.

Analyze the user's message and return a single JSON object with:
1. "action": exactly one of "CHAT", "PROPOSE_SWAP", "EXECUTE_SWAP", "CANCEL_SWAP".
   - "PROPOSE_SWAP" when the user describes a swap and tokens plus amount are known.
   - "EXECUTE_SWAP" only when a pending swap exists and the user clearly confirms it.
   - "CANCEL_SWAP" only when a pending swap exists and the user declines it.
   - "CHAT" for everything else, including asking for missing details.
2. "fromToken": the symbol of the token to swap from, or null.
3. "toToken": the symbol of the token to swap to, or null.
4. "amount": the numeric amount to swap (as a string), or null.
5. "response": a witty Gojo-style message confirming the action or asking for clarification.

Example: "I want to swap 100 USDC for EURC"
Result: {{ "action": "PROPOSE_SWAP", "fromToken": "USDC", "toToken": "EURC", "amount": "100", "response": "Infinity is at your fingertips. I've set up that swap for you. Don't worry, I'm the strongest, it'll be perfect." }}

Never ask for, repeat, or acknowledge private keys, seed phrases, or passwords.
Always return JSON."#
    )
}

/// Ordered parser chain: Groq, then the OpenAI-compatible secondary, then
/// the rule-based floor. Providers join only when their key is configured.
pub fn build_strategy_chain(
    config: &Config,
    quotes: Arc<QuoteService>,
) -> Vec<Box<dyn IntentStrategy>> {
    let mut chain: Vec<Box<dyn IntentStrategy>> = Vec::new();
    if let Some(groq) = ChatCompletionStrategy::groq(config) {
        chain.push(Box::new(groq));
    }
    if let Some(openai) = ChatCompletionStrategy::openai(config) {
        chain.push(Box::new(openai));
    }
    chain.push(Box::new(RuleBasedStrategy::new(quotes)));
    chain
}
