use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::{ConversationStore, Message, OpenAICompatClient};

/// Returned whenever the completion service cannot produce a reply
pub const FALLBACK_REPLY: &str = "Sorry, I can't respond right now.";

/// Stored turns included ahead of the new user turn
pub const HISTORY_WINDOW: usize = 10;

/// Produces the bot's reply to one user message. Never fails.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, conversation_id: &str, user_text: &str) -> String;
}

pub struct CompletionClient {
    api: OpenAICompatClient,
    system_prompt: String,
    memory: Option<Arc<dyn ConversationStore>>,
}

impl CompletionClient {
    pub fn new(api: OpenAICompatClient, system_prompt: impl Into<String>) -> Self {
        Self {
            api,
            system_prompt: system_prompt.into(),
            memory: None,
        }
    }

    /// Enable rolling memory backed by the given store
    pub fn with_memory(mut self, memory: Arc<dyn ConversationStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    async fn build_messages(&self, conversation_id: &str, user_text: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];

        if let Some(memory) = &self.memory {
            let history = memory.history(conversation_id).await;
            let skip = history.len().saturating_sub(HISTORY_WINDOW);
            messages.extend(history.into_iter().skip(skip));
        }

        messages.push(Message::user(user_text));
        messages
    }
}

#[async_trait]
impl ReplyGenerator for CompletionClient {
    async fn reply(&self, conversation_id: &str, user_text: &str) -> String {
        let messages = self.build_messages(conversation_id, user_text).await;

        match self.api.generate_text(&messages).await {
            Ok(text) => {
                if let Some(memory) = &self.memory {
                    memory
                        .record(
                            conversation_id,
                            vec![Message::user(user_text), Message::assistant(text.clone())],
                        )
                        .await;
                }
                text
            }
            Err(e) => {
                log::error!("[COMPLETION] Reply for {} failed: {}", conversation_id, e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
