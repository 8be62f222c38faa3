// src/models/mod.rs
pub mod chat;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use chat::{
    ConversationContext, Intent, Message, PendingSwap, Role, SwapAction, SwapChatRequest,
    SwapChatResponse, SwapQuoteRequest, SwapQuoteResponse, TokenDescriptor, TxStatus,
};
