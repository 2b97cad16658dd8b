use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::ai::ReplyGenerator;
use crate::channels::payload::parse_events;
use crate::channels::types::{InboundEvent, OutboundMessage, WebhookSummary};
use crate::channels::OutboundSender;
use crate::db::Database;
use crate::models::{Direction, MessageRecord, Platform};

/// Errors from an operator-initiated send
#[derive(Debug)]
pub enum ManualSendError {
    /// No credential stored for the platform
    NotConfigured(Platform),
    Storage(String),
    /// The platform API rejected or never received the message
    Send(String),
}

impl fmt::Display for ManualSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualSendError::NotConfigured(platform) => {
                write!(f, "No {} credential configured", platform)
            }
            ManualSendError::Storage(e) => write!(f, "Storage error: {}", e),
            ManualSendError::Send(e) => write!(f, "Send failed: {}", e),
        }
    }
}

/// Turns webhook deliveries into logged messages and AI replies
pub struct WebhookDispatcher {
    db: Arc<Database>,
    replier: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn OutboundSender>,
}

impl WebhookDispatcher {
    pub fn new(
        db: Arc<Database>,
        replier: Arc<dyn ReplyGenerator>,
        sender: Arc<dyn OutboundSender>,
    ) -> Self {
        Self { db, replier, sender }
    }

    /// Process every text message in a webhook payload, one after another.
    /// Individual failures are logged and never stop the batch.
    pub async fn process_payload(&self, payload: &Value) -> WebhookSummary {
        let events = parse_events(payload);
        let mut summary = WebhookSummary {
            received: events.len(),
            ..Default::default()
        };

        for event in events {
            if self.handle_event(&event).await {
                summary.replied += 1;
            } else {
                summary.dropped += 1;
            }
        }

        if summary.received > 0 {
            log::info!(
                "[WEBHOOK] Processed {} message(s): {} replied, {} dropped",
                summary.received,
                summary.replied,
                summary.dropped
            );
        }
        summary
    }

    /// Log, answer, and reply to one event. Returns true if a reply was delivered.
    pub async fn handle_event(&self, event: &InboundEvent) -> bool {
        log::info!(
            "[WEBHOOK] Incoming {} message from {} in {} ({})",
            event.platform,
            event.sender_id,
            event.chat_id,
            event.message_id.as_deref().unwrap_or("no id")
        );
        self.log_message(
            event.platform,
            &event.chat_id,
            &event.sender_id,
            &event.text,
            Direction::Incoming,
        );

        let Some(target) = self.reply_target(event) else {
            return false;
        };

        let reply = self
            .replier
            .reply(&event.conversation_id(), &event.text)
            .await;
        let (outbound, reply_chat_id) = target.into_outbound(reply);

        match self.sender.send(&outbound).await {
            Ok(()) => {
                self.log_message(
                    event.platform,
                    &reply_chat_id,
                    event.platform.bot_sender_id(),
                    outbound.text(),
                    Direction::Outgoing,
                );
                true
            }
            Err(e) => {
                log::warn!(
                    "[WEBHOOK] {} reply to {} not delivered: {}",
                    outbound.platform(),
                    outbound.recipient(),
                    e
                );
                false
            }
        }
    }

    /// Resolve where a reply to this event should go, if we can send one
    fn reply_target(&self, event: &InboundEvent) -> Option<ReplyTarget> {
        match event.platform {
            Platform::Messenger => match self.db.get_page_credential() {
                Ok(Some(page)) => Some(ReplyTarget::Messenger {
                    page_token: page.access_token,
                    recipient_id: event.sender_id.clone(),
                    chat_id: event.chat_id.clone(),
                }),
                Ok(None) => {
                    log::debug!("[WEBHOOK] No page connected, not replying to {}", event.sender_id);
                    None
                }
                Err(e) => {
                    log::error!("[WEBHOOK] Failed to load page credential: {}", e);
                    None
                }
            },
            Platform::Whatsapp => match self.db.get_whatsapp_credential() {
                Ok(Some(wa)) if wa.is_usable() => Some(ReplyTarget::Whatsapp {
                    phone_number_id: wa.phone_number_id,
                    token: wa.access_token,
                    to: event.sender_id.clone(),
                }),
                Ok(_) => {
                    log::debug!("[WEBHOOK] No WhatsApp number connected, not replying to {}", event.sender_id);
                    None
                }
                Err(e) => {
                    log::error!("[WEBHOOK] Failed to load WhatsApp credential: {}", e);
                    None
                }
            },
        }
    }

    /// Send an operator-written message and log it as outgoing.
    /// `chat_id` is the recipient: a Messenger PSID or a WhatsApp number.
    pub async fn send_manual(
        &self,
        platform: Platform,
        chat_id: &str,
        text: &str,
    ) -> Result<MessageRecord, ManualSendError> {
        let outbound = match platform {
            Platform::Messenger => {
                let page = self
                    .db
                    .get_page_credential()
                    .map_err(|e| ManualSendError::Storage(e.to_string()))?
                    .ok_or(ManualSendError::NotConfigured(platform))?;
                OutboundMessage::Messenger {
                    page_token: page.access_token,
                    recipient_id: chat_id.to_string(),
                    text: text.to_string(),
                }
            }
            Platform::Whatsapp => {
                let wa = self
                    .db
                    .get_whatsapp_credential()
                    .map_err(|e| ManualSendError::Storage(e.to_string()))?
                    .filter(|wa| wa.is_usable())
                    .ok_or(ManualSendError::NotConfigured(platform))?;
                OutboundMessage::Whatsapp {
                    phone_number_id: wa.phone_number_id,
                    token: wa.access_token,
                    to: chat_id.to_string(),
                    text: text.to_string(),
                }
            }
        };

        self.sender
            .send(&outbound)
            .await
            .map_err(ManualSendError::Send)?;

        self.db
            .insert_message(platform, chat_id, platform.bot_sender_id(), text, Direction::Outgoing)
            .map_err(|e| ManualSendError::Storage(e.to_string()))
    }

    fn log_message(
        &self,
        platform: Platform,
        chat_id: &str,
        sender_id: &str,
        text: &str,
        direction: Direction,
    ) {
        if let Err(e) = self
            .db
            .insert_message(platform, chat_id, sender_id, text, direction)
        {
            log::error!(
                "[WEBHOOK] Failed to log {} {} message in {}: {}",
                direction,
                platform,
                chat_id,
                e
            );
        }
    }
}

enum ReplyTarget {
    Messenger {
        page_token: String,
        recipient_id: String,
        chat_id: String,
    },
    Whatsapp {
        phone_number_id: String,
        token: String,
        to: String,
    },
}

impl ReplyTarget {
    /// Build the outbound message plus the chat id its log row is filed under
    fn into_outbound(self, text: String) -> (OutboundMessage, String) {
        match self {
            ReplyTarget::Messenger {
                page_token,
                recipient_id,
                chat_id,
            } => (
                OutboundMessage::Messenger {
                    page_token,
                    recipient_id,
                    text,
                },
                chat_id,
            ),
            ReplyTarget::Whatsapp {
                phone_number_id,
                token,
                to,
            } => (
                OutboundMessage::Whatsapp {
                    phone_number_id: phone_number_id.clone(),
                    token,
                    to,
                    text,
                },
                phone_number_id,
            ),
        }
    }
}
