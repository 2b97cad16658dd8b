use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Messenger,
    Whatsapp,
}

impl Platform {
    /// Synthetic sender id used when logging our own replies
    pub fn bot_sender_id(&self) -> &'static str {
        match self {
            Platform::Messenger => "page",
            Platform::Whatsapp => "wa_bot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// One logged message. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub platform: Platform,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub direction: Direction,
    /// Unix milliseconds, assigned on insert
    pub timestamp: i64,
}
