pub mod dispatcher;
pub mod messenger;
pub mod payload;
pub mod signature;
pub mod types;
pub mod whatsapp;

pub use dispatcher::WebhookDispatcher;
pub use messenger::MessengerSender;
pub use types::OutboundMessage;
pub use whatsapp::WhatsappSender;

use async_trait::async_trait;

use crate::graph::GraphClient;

/// Delivers replies to the messaging platforms
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), String>;
}

/// Routes each outbound message to the matching Graph API adapter
pub struct GraphSender {
    messenger: MessengerSender,
    whatsapp: WhatsappSender,
}

impl GraphSender {
    pub fn new(graph: GraphClient) -> Self {
        Self {
            messenger: MessengerSender::new(graph.clone()),
            whatsapp: WhatsappSender::new(graph),
        }
    }
}

#[async_trait]
impl OutboundSender for GraphSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), String> {
        match message {
            OutboundMessage::Messenger {
                page_token,
                recipient_id,
                text,
            } => self.messenger.send(page_token, recipient_id, text).await,
            OutboundMessage::Whatsapp {
                phone_number_id,
                token,
                to,
                text,
            } => self.whatsapp.send(phone_number_id, token, to, text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_graph_sender_routes_by_platform() {
        let server = MockServer::start();
        let messenger = server.mock(|when, then| {
            when.method(POST).path("/v19.0/me/messages");
            then.status(200).json_body(json!({}));
        });
        let whatsapp = server.mock(|when, then| {
            when.method(POST).path("/v19.0/P1/messages");
            then.status(200).json_body(json!({}));
        });

        let sender = GraphSender::new(
            GraphClient::new(&server.base_url(), "v19.0", Duration::from_secs(5)).unwrap(),
        );

        sender
            .send(&OutboundMessage::Messenger {
                page_token: "pt".to_string(),
                recipient_id: "U1".to_string(),
                text: "a".to_string(),
            })
            .await
            .unwrap();
        sender
            .send(&OutboundMessage::Whatsapp {
                phone_number_id: "P1".to_string(),
                token: "wt".to_string(),
                to: "555".to_string(),
                text: "b".to_string(),
            })
            .await
            .unwrap();

        messenger.assert_calls(1);
        whatsapp.assert_calls(1);
    }
}
