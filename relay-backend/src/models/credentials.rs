use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The connected Messenger page. Only one is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCredential {
    pub page_id: String,
    pub page_name: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub subscribed: bool,
    pub updated_at: DateTime<Utc>,
}

/// The connected WhatsApp Business phone number. Only one is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappCredential {
    pub phone_number_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub display_phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WhatsappCredential {
    /// Both the sending phone number and its token are needed to reply
    pub fn is_usable(&self) -> bool {
        !self.phone_number_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}
