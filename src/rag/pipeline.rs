//! Question answering pipeline
//!
//! [`ChatService`] wires retrieval, generation, confidence scoring and
//! conversation tracking together and is the entry point used by the HTTP
//! API and the CLI.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use chrono::Utc;
use futures::Stream;
use futures::StreamExt;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::confidence::estimate_confidence;
use super::conversation::ConversationManager;
use super::generator::AnswerGenerator;
use super::ingest;
use crate::chunking::TextChunker;
use crate::config::AppConfig;
use crate::config::RagConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::AskRagError;
use crate::errors::Result;
use crate::llm::OpenAiChatClient;
use crate::models::ChatMessage;
use crate::models::ChatRequest;
use crate::models::ChatResponse;
use crate::models::RetrievalResult;
use crate::models::SourceDocument;
use crate::vector_store::open_store;
use crate::vector_store::VectorIndex;

/// Retrieval and conversation settings for [`ChatService`]
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub top_k: usize,
    pub max_distance: Option<f32>,
    pub subject: String,
    pub include_history: bool,
    pub max_conversations: usize,
}

impl ChatSettings {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            top_k: config.retrieval_top_k,
            max_distance: config.max_distance,
            subject: config.subject.clone(),
            include_history: config.include_history,
            max_conversations: config.max_conversations,
        }
    }

    /// Answer given when retrieval finds nothing
    pub fn fallback_answer(&self) -> String {
        format!(
            "I don't have enough information to answer that question. \
             Could you ask something else about {}'s background, skills, or experience?",
            self.subject
        )
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// One event of a streamed answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next fragment of the answer text
    Delta(String),
    /// The answer is complete and recorded in the conversation
    Done,
}

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// A streamed answer bound to its conversation; consumed once
pub struct AnswerStream {
    pub conversation_id: Uuid,
    pub sources: Vec<SourceDocument>,
    events: EventStream,
}

impl Stream for AnswerStream {
    type Item = Result<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

pub struct ChatService {
    index: Arc<VectorIndex>,
    generator: Arc<AnswerGenerator>,
    conversations: Arc<ConversationManager>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(index: Arc<VectorIndex>, generator: AnswerGenerator, settings: ChatSettings) -> Self {
        Self {
            index,
            generator: Arc::new(generator),
            conversations: Arc::new(ConversationManager::new(settings.max_conversations)),
            settings,
        }
    }

    /// Build the full stack (store, embeddings, model client) from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = open_store(config).await?;
        let embeddings = Arc::new(EmbeddingService::new(config)?);
        let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap);
        let index = Arc::new(VectorIndex::new(store, embeddings, chunker));

        let llm = Arc::new(OpenAiChatClient::new(&config.llm)?);
        let generator = AnswerGenerator::new(llm, &config.rag.subject, config.rag.include_history);

        Ok(Self::new(index, generator, ChatSettings::from_config(&config.rag)))
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Answer one question, recording the exchange in its conversation
    pub async fn ask_question(&self, request: ChatRequest) -> Result<ChatResponse> {
        request.validate()?;
        let conversation_id = request.conversation_id.unwrap_or_else(Uuid::new_v4);
        info!(
            "Processing question: {}",
            request.question.chars().take(100).collect::<String>()
        );

        let sources = self.retrieve(&request.question).await?;
        if sources.is_empty() {
            warn!("No relevant sources found for question");
            return Ok(ChatResponse {
                message_id: Uuid::new_v4(),
                conversation_id,
                answer: self.settings.fallback_answer(),
                sources: Vec::new(),
                confidence: 0.0,
                timestamp: Utc::now(),
                model_used: self.generator.model_name().to_string(),
                tokens_used: Some(0),
            });
        }

        let history = self
            .conversations
            .get_history(&conversation_id)
            .unwrap_or_default();
        let (answer, metadata) = self
            .generator
            .generate_answer(&request.question, &sources, &history)
            .await?;

        self.conversations
            .append_exchange(conversation_id, &request.question, &answer);

        let confidence = estimate_confidence(&sources, &answer);
        debug!("Answer confidence {:.2}", confidence);

        Ok(ChatResponse {
            message_id: Uuid::new_v4(),
            conversation_id,
            answer,
            sources: sources.iter().map(SourceDocument::from).collect(),
            confidence,
            timestamp: Utc::now(),
            model_used: metadata.model,
            tokens_used: metadata.tokens_used,
        })
    }

    /// Answer one question as a stream of fragments.
    ///
    /// The exchange is recorded only once the model stream has finished; a
    /// consumer that drops the stream early leaves the conversation untouched.
    pub async fn ask_question_stream(&self, request: ChatRequest) -> Result<AnswerStream> {
        request.validate()?;
        let conversation_id = request.conversation_id.unwrap_or_else(Uuid::new_v4);
        info!(
            "Streaming answer for question: {}",
            request.question.chars().take(100).collect::<String>()
        );

        let sources = self.retrieve(&request.question).await?;
        if sources.is_empty() {
            warn!("No relevant sources found for question");
            let events = futures::stream::iter(vec![
                Ok(StreamEvent::Delta(self.settings.fallback_answer())),
                Ok(StreamEvent::Done),
            ]);
            return Ok(AnswerStream {
                conversation_id,
                sources: Vec::new(),
                events: Box::pin(events),
            });
        }

        let history = self
            .conversations
            .get_history(&conversation_id)
            .unwrap_or_default();
        let mut fragments = self
            .generator
            .generate_answer_stream(&request.question, &sources, &history)
            .await?
            .into_stream();

        let conversations = Arc::clone(&self.conversations);
        let question = request.question;
        let events = async_stream::stream! {
            let mut answer = String::new();
            let mut failed = false;
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        answer.push_str(&text);
                        yield Ok(StreamEvent::Delta(text));
                    }
                    Err(e) => {
                        warn!("Answer stream failed: {}", e);
                        failed = true;
                        yield Err(e);
                        break;
                    }
                }
            }
            if !failed {
                conversations.append_exchange(conversation_id, &question, &answer);
                yield Ok(StreamEvent::Done);
            }
        };

        Ok(AnswerStream {
            conversation_id,
            sources: sources.iter().map(SourceDocument::from).collect(),
            events: Box::pin(events),
        })
    }

    /// Model-written summary; `None` when the conversation is unknown
    pub async fn get_conversation_summary(&self, conversation_id: &Uuid) -> Result<Option<String>> {
        let Some(history) = self.conversations.get_history(conversation_id) else {
            return Ok(None);
        };
        if history.is_empty() {
            return Ok(None);
        }
        let summary = self.generator.summarize_conversation(&history).await?;
        Ok(Some(summary))
    }

    pub fn get_conversation_history(&self, conversation_id: &Uuid) -> Result<Vec<ChatMessage>> {
        self.conversations
            .get_history(conversation_id)
            .ok_or_else(|| AskRagError::NotFound(format!("conversation {conversation_id}")))
    }

    pub fn clear_conversation(&self, conversation_id: &Uuid) -> bool {
        self.conversations.clear(conversation_id)
    }

    pub fn get_active_conversation_count(&self) -> usize {
        self.conversations.count()
    }

    /// Ingest a directory into this service's index
    pub async fn ingest_directory(&self, dir: &Path, extensions: &[String]) -> Result<usize> {
        ingest::ingest_directory(&self.index, dir, extensions).await
    }

    async fn retrieve(&self, question: &str) -> Result<Vec<RetrievalResult>> {
        let mut sources = self
            .index
            .similarity_search(question, self.settings.top_k)
            .await?;

        if let Some(max_distance) = self.settings.max_distance {
            let before = sources.len();
            sources.retain(|source| source.distance <= max_distance);
            if sources.len() < before {
                debug!(
                    "Dropped {} sources farther than {}",
                    before - sources.len(),
                    max_distance
                );
            }
        }
        Ok(sources)
    }
}
