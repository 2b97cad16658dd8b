use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::channels::dispatcher::ManualSendError;
use crate::models::{MessageRecord, Platform};
use crate::AppState;

/// Records returned by `GET /messages`
pub const RECENT_MESSAGES_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub platform: Option<String>,
    pub chat_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<MessageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendMessageResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            error: Some(message.into()),
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/messages").route(web::get().to(list_messages)));
    cfg.service(web::resource("/send_message").route(web::post().to(send_message)));
}

async fn list_messages(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_recent_messages(RECENT_MESSAGES_LIMIT) {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            log::error!("Failed to list messages: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to retrieve messages"
            }))
        }
    }
}

async fn send_message(
    state: web::Data<AppState>,
    body: web::Json<SendMessageRequest>,
) -> impl Responder {
    let Some(text) = body.message.as_deref().filter(|m| !m.trim().is_empty()) else {
        return HttpResponse::BadRequest().json(SendMessageResponse::error("message is required"));
    };

    let Some(platform) = body
        .platform
        .as_deref()
        .and_then(|p| Platform::from_str(&p.trim().to_lowercase()).ok())
    else {
        return HttpResponse::BadRequest().json(SendMessageResponse::error(
            "platform must be one of: messenger, whatsapp",
        ));
    };

    let Some(chat_id) = body.chat_id.as_deref().filter(|c| !c.trim().is_empty()) else {
        return HttpResponse::BadRequest().json(SendMessageResponse::error("chat_id is required"));
    };

    match state.dispatcher.send_manual(platform, chat_id, text).await {
        Ok(record) => HttpResponse::Ok().json(SendMessageResponse {
            success: true,
            record: Some(record),
            error: None,
        }),
        Err(e @ ManualSendError::NotConfigured(_)) => {
            HttpResponse::BadRequest().json(SendMessageResponse::error(e.to_string()))
        }
        Err(e @ ManualSendError::Send(_)) => {
            log::warn!("[{}] Manual send to {} failed: {}", platform, chat_id, e);
            HttpResponse::BadGateway().json(SendMessageResponse::error(e.to_string()))
        }
        Err(e @ ManualSendError::Storage(_)) => {
            log::error!("Manual send to {} on {}: {}", chat_id, platform, e);
            HttpResponse::InternalServerError().json(SendMessageResponse::error("Internal server error"))
        }
    }
}
