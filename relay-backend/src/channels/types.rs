use crate::models::Platform;

/// A text message received from either platform, normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub platform: Platform,
    /// Messenger: the entry (page) id, falling back to the sender.
    /// WhatsApp: the receiving phone number id.
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    /// Platform message id (`mid` / WhatsApp `id`), for logging only
    pub message_id: Option<String>,
}

impl InboundEvent {
    /// Key under which the completion client keeps rolling memory
    pub fn conversation_id(&self) -> String {
        format!("{}:{}:{}", self.platform, self.chat_id, self.sender_id)
    }
}

/// A reply ready to be sent through one platform's API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Messenger {
        page_token: String,
        recipient_id: String,
        text: String,
    },
    Whatsapp {
        phone_number_id: String,
        token: String,
        to: String,
        text: String,
    },
}

impl OutboundMessage {
    pub fn platform(&self) -> Platform {
        match self {
            OutboundMessage::Messenger { .. } => Platform::Messenger,
            OutboundMessage::Whatsapp { .. } => Platform::Whatsapp,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            OutboundMessage::Messenger { recipient_id, .. } => recipient_id,
            OutboundMessage::Whatsapp { to, .. } => to,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            OutboundMessage::Messenger { text, .. } | OutboundMessage::Whatsapp { text, .. } => text,
        }
    }
}

/// Outcome of processing one webhook delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookSummary {
    /// Text messages found in the payload
    pub received: usize,
    /// Replies delivered to the platform
    pub replied: usize,
    /// Replies not delivered (no credential or send failure)
    pub dropped: usize,
}
