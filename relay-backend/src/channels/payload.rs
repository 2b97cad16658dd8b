//! Normalizes Messenger and WhatsApp Cloud webhook payloads into [`InboundEvent`]s
//!
//! Both platforms deliver `{"entry": [...]}`. Messenger entries carry a
//! `messaging` list, WhatsApp entries a `changes` list. Anything that fits
//! neither shape is skipped on its own without failing the rest of the batch.

use serde::Deserialize;
use serde_json::Value;

use super::types::InboundEvent;
use crate::models::Platform;

#[derive(Debug, Deserialize)]
struct MessagingItem {
    sender: Option<IdRef>,
    message: Option<MessengerMessage>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: Value,
}

#[derive(Debug, Deserialize)]
struct MessengerMessage {
    mid: Option<String>,
    text: Option<String>,
    #[serde(default)]
    is_echo: bool,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: Option<ChangeValue>,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    metadata: Option<Metadata>,
    messages: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    phone_number_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WhatsappMessage {
    id: Option<String>,
    from: Option<Value>,
    text: Option<WhatsappText>,
}

#[derive(Debug, Deserialize)]
struct WhatsappText {
    body: Option<String>,
}

/// Ids arrive as strings, but numeric ids are accepted too
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract every text message in the payload, in delivery order
pub fn parse_events(payload: &Value) -> Vec<InboundEvent> {
    let Some(entries) = payload.get("entry").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for entry in entries {
        if let Some(messaging) = entry.get("messaging").and_then(Value::as_array) {
            let entry_id = entry.get("id").and_then(id_string);
            events.extend(
                messaging
                    .iter()
                    .filter_map(|item| parse_messaging_item(item, entry_id.as_deref())),
            );
        }

        if let Some(changes) = entry.get("changes").and_then(Value::as_array) {
            for change in changes {
                events.extend(parse_change(change));
            }
        }
    }
    events
}

fn parse_messaging_item(item: &Value, entry_id: Option<&str>) -> Option<InboundEvent> {
    let item: MessagingItem = serde_json::from_value(item.clone())
        .map_err(|e| log::debug!("[WEBHOOK] Skipping messaging item: {}", e))
        .ok()?;

    let message = item.message?;
    if message.is_echo {
        return None;
    }
    let text = message.text.filter(|t| !t.is_empty())?;
    let sender_id = item.sender.as_ref().and_then(|s| id_string(&s.id))?;
    let chat_id = entry_id.map(str::to_string).unwrap_or_else(|| sender_id.clone());

    Some(InboundEvent {
        platform: Platform::Messenger,
        chat_id,
        sender_id,
        text,
        message_id: message.mid,
    })
}

fn parse_change(change: &Value) -> Vec<InboundEvent> {
    let value = match serde_json::from_value::<Change>(change.clone()) {
        Ok(Change { value: Some(value) }) => value,
        Ok(_) => return Vec::new(),
        Err(e) => {
            log::debug!("[WEBHOOK] Skipping change: {}", e);
            return Vec::new();
        }
    };

    let chat_id = value
        .metadata
        .as_ref()
        .and_then(|m| m.phone_number_id.as_ref())
        .and_then(id_string)
        .unwrap_or_default();

    value
        .messages
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| {
            // Non-text messages (images, reactions, ...) have no text body
            let message: WhatsappMessage = serde_json::from_value(raw).ok()?;
            let text = message.text?.body.filter(|b| !b.is_empty())?;
            let from = message.from.as_ref().and_then(id_string)?;
            Some(InboundEvent {
                platform: Platform::Whatsapp,
                chat_id: chat_id.clone(),
                sender_id: from,
                text,
                message_id: message.id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messenger_text_message() {
        let payload = json!({
            "object": "page",
            "entry": [{
                "id": "E1",
                "time": 1700000000,
                "messaging": [{
                    "sender": {"id": "U1"},
                    "recipient": {"id": "E1"},
                    "message": {"mid": "m_1", "text": "hi"}
                }]
            }]
        });

        let events = parse_events(&payload);
        assert_eq!(
            events,
            vec![InboundEvent {
                platform: Platform::Messenger,
                chat_id: "E1".to_string(),
                sender_id: "U1".to_string(),
                text: "hi".to_string(),
                message_id: Some("m_1".to_string()),
            }]
        );
        assert_eq!(events[0].conversation_id(), "messenger:E1:U1");
    }

    #[test]
    fn test_messenger_chat_id_falls_back_to_sender() {
        let payload = json!({
            "entry": [{"messaging": [{"sender": {"id": "U1"}, "message": {"text": "hi"}}]}]
        });

        let events = parse_events(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chat_id, "U1");
    }

    #[test]
    fn test_messenger_skips_echoes_and_non_text() {
        let payload = json!({
            "entry": [{
                "id": "E1",
                "messaging": [
                    {"sender": {"id": "E1"}, "message": {"text": "our own reply", "is_echo": true}},
                    {"sender": {"id": "U1"}, "message": {"attachments": [{"type": "image"}]}},
                    {"sender": {"id": "U1"}, "delivery": {"watermark": 1}},
                    {"sender": {"id": "U1"}, "read": {"watermark": 2}},
                    {"sender": {"id": "U2"}, "message": {"text": "real one"}}
                ]
            }]
        });

        let events = parse_events(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sender_id, "U2");
        assert_eq!(events[0].text, "real one");
    }

    #[test]
    fn test_whatsapp_text_message() {
        let payload = json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {"display_phone_number": "15550100", "phone_number_id": "P1"},
                        "messages": [{"from": "555", "id": "wamid.1", "type": "text", "text": {"body": "hey"}}]
                    }
                }]
            }]
        });

        let events = parse_events(&payload);
        assert_eq!(
            events,
            vec![InboundEvent {
                platform: Platform::Whatsapp,
                chat_id: "P1".to_string(),
                sender_id: "555".to_string(),
                text: "hey".to_string(),
                message_id: Some("wamid.1".to_string()),
            }]
        );
    }

    #[test]
    fn test_whatsapp_status_updates_and_media_are_ignored() {
        let payload = json!({
            "entry": [{
                "changes": [
                    {"value": {"metadata": {"phone_number_id": "P1"}, "statuses": [{"id": "wamid.1", "status": "read"}]}},
                    {"value": {"metadata": {"phone_number_id": "P1"}, "messages": []}},
                    {"value": {"metadata": {"phone_number_id": "P1"}, "messages": [{"from": "555", "type": "image", "image": {"id": "x"}}]}}
                ]
            }]
        });

        assert!(parse_events(&payload).is_empty());
    }

    #[test]
    fn test_whatsapp_missing_metadata_gives_empty_chat_id() {
        let payload = json!({
            "entry": [{"changes": [{"value": {"messages": [{"from": "555", "text": {"body": "hey"}}]}}]}]
        });

        let events = parse_events(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chat_id, "");
    }

    #[test]
    fn test_mixed_entries_keep_order() {
        let payload = json!({
            "entry": [
                {"id": "E1", "messaging": [{"sender": {"id": "U1"}, "message": {"text": "first"}}]},
                {"changes": [{"value": {"metadata": {"phone_number_id": "P1"}, "messages": [{"from": "555", "text": {"body": "second"}}]}}]},
                {"id": "E1", "messaging": [{"sender": {"id": "U1"}, "message": {"text": "third"}}]}
            ]
        });

        let texts: Vec<String> = parse_events(&payload).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unrecognized_shapes_yield_nothing() {
        for payload in [
            json!({}),
            json!({"entry": "not a list"}),
            json!({"entry": [{"id": "E1", "standby": []}]}),
            json!({"entry": [{"messaging": "nope", "changes": {"value": 1}}]}),
            json!({"entry": [{"messaging": [{"sender": "U1", "message": {"text": 5}}]}]}),
            json!({"entry": [{"changes": [{"value": "oops"}, 42]}]}),
            json!([1, 2, 3]),
        ] {
            assert!(parse_events(&payload).is_empty(), "payload: {}", payload);
        }
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let payload = json!({
            "entry": [{"id": 111, "messaging": [{"sender": {"id": 222}, "message": {"text": "hi"}}]}]
        });

        let events = parse_events(&payload);
        assert_eq!(events[0].chat_id, "111");
        assert_eq!(events[0].sender_id, "222");
    }
}
