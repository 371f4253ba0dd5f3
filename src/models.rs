use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Free-form chunk metadata (`source`, `path`, `chunk_index`, ...)
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the source file name
pub const META_SOURCE: &str = "source";
/// Metadata key holding the chunk's position in its parent document
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key holding the number of chunks of the parent document
pub const META_TOTAL_CHUNKS: &str = "total_chunks";

/// A chunk as persisted in a vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a similarity search; smaller distance is more similar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub metadata: Metadata,
    pub distance: f32,
}

impl RetrievalResult {
    /// Source file the chunk was cut from
    pub fn source_name(&self) -> &str {
        self.metadata
            .get(META_SOURCE)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Unknown")
    }

    /// Map the L2 distance onto a 0-1 relevance score, higher is better
    pub fn relevance_score(&self) -> f32 {
        let score = (1.0 - self.distance / 2.0).clamp(0.0, 1.0);
        (score * 100.0).round() / 100.0
    }
}

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Chat message in conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Maximum accepted question length in characters
pub const MAX_QUESTION_CHARS: usize = 1000;

/// A question sent by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: None,
            stream: false,
        }
    }

    #[must_use]
    pub fn with_conversation(mut self, conversation_id: Uuid) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    /// Reject blank or oversized questions
    pub fn validate(&self) -> crate::Result<()> {
        if self.question.trim().is_empty() {
            return Err(crate::AskRagError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }
        let len = self.question.chars().count();
        if len > MAX_QUESTION_CHARS {
            return Err(crate::AskRagError::InvalidInput(format!(
                "question is {len} characters, the limit is {MAX_QUESTION_CHARS}"
            )));
        }
        Ok(())
    }
}

/// A piece of retrieved context returned alongside an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    pub metadata: Metadata,
    pub relevance_score: Option<f32>,
}

impl From<&RetrievalResult> for SourceDocument {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            content: result.text.clone(),
            metadata: result.metadata.clone(),
            relevance_score: Some(result.relevance_score()),
        }
    }
}

/// An answer produced for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub answer: String,
    pub sources: Vec<SourceDocument>,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    pub tokens_used: Option<u32>,
}
