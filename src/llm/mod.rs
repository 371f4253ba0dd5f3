//! Language model access
//!
//! The answer generator talks to a [`LanguageModel`]; [`OpenAiChatClient`]
//! implements it over any OpenAI-compatible `/chat/completions` endpoint.

pub mod client;
pub mod prompts;
pub mod streaming;

use async_trait::async_trait;
pub use client::OpenAiChatClient;
pub use prompts::PromptTemplate;
pub use prompts::RagPrompts;
pub use streaming::StreamingResponse;

use crate::errors::Result;
use crate::models::ChatMessage;

/// A finished model answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Prompt plus completion tokens, when the provider reports usage
    pub total_tokens: Option<u32>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// One request, one answer
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion>;

    /// One request, answer delivered as text fragments
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse>;
}
