// All service modules
pub mod dialogue;
pub mod intent;
pub mod quote_service;
pub mod rule_parser;
pub mod token_registry;

// Re-export for convenience
pub use dialogue::DialogueController;
pub use quote_service::QuoteService;
pub use token_registry::TokenRegistry;
