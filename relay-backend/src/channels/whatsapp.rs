//! WhatsApp Cloud API adapter

use serde_json::json;

use crate::graph::{error_for_status, request_failed, GraphClient};

pub struct WhatsappSender {
    graph: GraphClient,
}

impl WhatsappSender {
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }

    /// Send a text message from `phone_number_id` to `to_number`
    pub async fn send(
        &self,
        phone_number_id: &str,
        token: &str,
        to_number: &str,
        text: &str,
    ) -> Result<(), String> {
        let response = self
            .graph
            .http()
            .post(self.graph.url(&format!("/{}/messages", phone_number_id)))
            .bearer_auth(token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to_number,
                "type": "text",
                "text": { "body": text },
            }))
            .send()
            .await
            .map_err(|e| request_failed("WhatsApp send", e))?;

        error_for_status(response, "WhatsApp Cloud API").await?;
        log::info!("[WHATSAPP] Sent reply to {}", to_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn sender(server: &MockServer) -> WhatsappSender {
        WhatsappSender::new(GraphClient::new(&server.base_url(), "v19.0", Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_send_posts_text_body_with_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v19.0/P1/messages")
                .header("authorization", "Bearer wa-token")
                .json_body(json!({
                    "messaging_product": "whatsapp",
                    "to": "555",
                    "type": "text",
                    "text": {"body": "hey back"}
                }));
            then.status(200).json_body(json!({"messages": [{"id": "wamid.2"}]}));
        });

        sender(&server).send("P1", "wa-token", "555", "hey back").await.unwrap();
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_send_error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v19.0/P1/messages");
            then.status(401).body("unauthorized");
        });

        let err = sender(&server).send("P1", "bad", "555", "x").await.unwrap_err();
        assert!(err.contains("401"));
        assert!(err.contains("unauthorized"));
    }
}
