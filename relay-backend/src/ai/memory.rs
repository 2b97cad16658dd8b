//! Rolling per-conversation memory for the completion client

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;

use crate::ai::Message;

/// Backing store for recent conversation turns
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored turns for a conversation, oldest first
    async fn history(&self, conversation_id: &str) -> Vec<Message>;

    /// Append turns, keeping only the most recent ones
    async fn record(&self, conversation_id: &str, turns: Vec<Message>);
}

/// Process-lifetime ring buffer per conversation. Lost on restart.
pub struct InMemoryConversationStore {
    max_turns: usize,
    conversations: DashMap<String, VecDeque<Message>>,
}

impl InMemoryConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            conversations: DashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.conversations
            .get(conversation_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn record(&self, conversation_id: &str, turns: Vec<Message>) {
        if self.max_turns == 0 {
            return;
        }

        let mut entry = self
            .conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.max_turns));

        for turn in turns {
            if entry.len() == self.max_turns {
                entry.pop_front();
            }
            entry.push_back(turn);
        }
    }
}
