//! Grounded answer generation

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::errors::Result;
use crate::llm::LanguageModel;
use crate::llm::RagPrompts;
use crate::llm::StreamingResponse;
use crate::models::ChatMessage;
use crate::models::RetrievalResult;
use crate::models::Role;

/// Context text used when retrieval produced nothing
pub const NO_CONTEXT: &str = "No relevant context found.";

/// What a generation call reports besides the answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMetadata {
    pub model: String,
    pub tokens_used: Option<u32>,
    pub sources_used: usize,
}

/// Builds grounded prompts and asks the language model
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    system_prompt: String,
    include_history: bool,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, subject: &str, include_history: bool) -> Self {
        Self {
            llm,
            system_prompt: RagPrompts::system(subject),
            include_history,
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Render sources as numbered, labelled blocks in the order given
    pub fn format_context(sources: &[RetrievalResult]) -> String {
        if sources.is_empty() {
            return NO_CONTEXT.to_string();
        }

        sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                format!(
                    "[Source {} - {}]\n{}\n",
                    i + 1,
                    source.source_name(),
                    source.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Answer `question` from `sources` with a single model request
    pub async fn generate_answer(
        &self,
        question: &str,
        sources: &[RetrievalResult],
        history: &[ChatMessage],
    ) -> Result<(String, GenerationMetadata)> {
        let messages = self.build_messages(question, sources, history);

        info!(
            "Generating answer for: {}",
            question.chars().take(100).collect::<String>()
        );
        let completion = self.llm.complete(&messages).await?;

        let metadata = GenerationMetadata {
            model: self.llm.model_name().to_string(),
            tokens_used: completion.total_tokens,
            sources_used: sources.len(),
        };
        info!(
            "Generated answer with {} tokens",
            metadata
                .tokens_used
                .map_or_else(|| "unknown".to_string(), |t| t.to_string())
        );

        Ok((completion.text, metadata))
    }

    /// Same prompt as [`generate_answer`](Self::generate_answer), answer streamed
    pub async fn generate_answer_stream(
        &self,
        question: &str,
        sources: &[RetrievalResult],
        history: &[ChatMessage],
    ) -> Result<StreamingResponse> {
        let messages = self.build_messages(question, sources, history);
        self.llm.complete_stream(&messages).await
    }

    /// Two or three sentence summary of a conversation
    pub async fn summarize_conversation(&self, history: &[ChatMessage]) -> Result<String> {
        let transcript = history
            .iter()
            .map(|message| {
                let speaker = match message.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::System => "System",
                };
                format!("{speaker}: {}", message.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = RagPrompts::conversation_summary()
            .render(&HashMap::from([("conversation", transcript.as_str())]));
        let completion = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        Ok(completion.text.trim().to_string())
    }

    fn build_messages(
        &self,
        question: &str,
        sources: &[RetrievalResult],
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let context = Self::format_context(sources);
        let prompt = RagPrompts::context_qa().render(&HashMap::from([
            ("context", context.as_str()),
            ("question", question),
        ]));

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        if self.include_history {
            messages.extend(
                history
                    .iter()
                    .filter(|message| message.role != Role::System)
                    .cloned(),
            );
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }
}
