//! Messenger Send API adapter

use serde_json::json;

use crate::graph::{error_for_status, request_failed, GraphClient};

pub struct MessengerSender {
    graph: GraphClient,
}

impl MessengerSender {
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }

    /// Send a text reply to a user on behalf of the page
    pub async fn send(&self, page_token: &str, recipient_id: &str, text: &str) -> Result<(), String> {
        let response = self
            .graph
            .http()
            .post(self.graph.url("/me/messages"))
            .query(&[("access_token", page_token)])
            .json(&json!({
                "recipient": { "id": recipient_id },
                "message": { "text": text },
                "messaging_type": "RESPONSE",
            }))
            .send()
            .await
            .map_err(|e| request_failed("Messenger send", e))?;

        error_for_status(response, "Messenger Send API").await?;
        log::info!("[MESSENGER] Sent reply to {}", recipient_id);
        Ok(())
    }
}
