// src/api/mod.rs

pub mod ai;
pub mod health;
pub mod swap;
pub mod tokens;

use crate::config::Config;
use crate::services::{DialogueController, QuoteService, TokenRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<TokenRegistry>,
    pub quotes: Arc<QuoteService>,
    pub dialogue: Arc<DialogueController>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let quotes = Arc::new(QuoteService::from_config(&config));
        let dialogue = Arc::new(DialogueController::new(&config, quotes.clone()));
        Self {
            config,
            registry: Arc::new(TokenRegistry::arc_testnet()),
            quotes,
            dialogue,
        }
    }
}
