/// API request handlers
use std::sync::Arc;

use crate::api::auth::ApiKeyState;
use crate::api::rate_limit::RateLimiter;
use crate::config::SecurityConfig;
use crate::rag::ChatService;

pub mod admin;
pub mod chat;
pub mod health;

pub use admin::*;
pub use chat::*;
pub use health::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub api_key: ApiKeyState,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(chat_service: Arc<ChatService>, security: &SecurityConfig) -> Self {
        Self {
            chat_service,
            api_key: ApiKeyState::new(security.api_key.clone()),
            rate_limiter: Arc::new(RateLimiter::per_minute(
                security.rate_limit_per_minute,
                security.rate_limit_enabled,
            )),
        }
    }
}
