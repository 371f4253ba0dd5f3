//! In-memory conversation history

use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::models::ChatMessage;

/// Messages kept per conversation (five question/answer pairs)
pub const MAX_HISTORY_MESSAGES: usize = 10;

/// Default cap on concurrently tracked conversations
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

#[derive(Debug, Clone)]
struct Conversation {
    messages: Vec<ChatMessage>,
    last_activity: Instant,
}

/// Rolling per-conversation message windows, lost on restart
pub struct ConversationManager {
    conversations: DashMap<Uuid, Conversation>,
    max_conversations: usize,
}

impl ConversationManager {
    #[must_use]
    pub fn new(max_conversations: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            max_conversations: max_conversations.max(1),
        }
    }

    /// Append a question and its answer, keeping the most recent messages
    pub fn append_exchange(&self, conversation_id: Uuid, question: &str, answer: &str) {
        if !self.conversations.contains_key(&conversation_id) {
            self.make_room();
        }

        let mut entry = self
            .conversations
            .entry(conversation_id)
            .or_insert_with(|| Conversation {
                messages: Vec::with_capacity(MAX_HISTORY_MESSAGES + 2),
                last_activity: Instant::now(),
            });

        let conversation = entry.value_mut();
        conversation.messages.push(ChatMessage::user(question));
        conversation.messages.push(ChatMessage::assistant(answer));
        if conversation.messages.len() > MAX_HISTORY_MESSAGES {
            let excess = conversation.messages.len() - MAX_HISTORY_MESSAGES;
            conversation.messages.drain(..excess);
        }
        conversation.last_activity = Instant::now();

        debug!(
            "Conversation {} now holds {} messages",
            conversation_id,
            conversation.messages.len()
        );
    }

    /// Messages of a conversation, oldest first
    pub fn get_history(&self, conversation_id: &Uuid) -> Option<Vec<ChatMessage>> {
        self.conversations
            .get(conversation_id)
            .map(|entry| entry.messages.clone())
    }

    /// Forget a conversation; reports whether it existed
    pub fn clear(&self, conversation_id: &Uuid) -> bool {
        let removed = self.conversations.remove(conversation_id).is_some();
        if removed {
            info!("Cleared conversation {}", conversation_id);
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.conversations.len()
    }

    /// Evict least recently active conversations until one more fits
    fn make_room(&self) {
        while self.conversations.len() >= self.max_conversations {
            let oldest = self
                .conversations
                .iter()
                .min_by_key(|entry| entry.last_activity)
                .map(|entry| *entry.key());

            match oldest {
                Some(id) => {
                    self.conversations.remove(&id);
                    debug!("Evicted idle conversation {}", id);
                }
                None => break,
            }
        }
    }
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONVERSATIONS)
    }
}
