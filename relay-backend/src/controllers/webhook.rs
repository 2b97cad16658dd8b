use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::Value;

use crate::channels::signature::{verify_signature, SIGNATURE_HEADER};
use crate::AppState;

/// Body returned once a delivery has been processed
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/webhook")
            .route(web::get().to(verify_webhook))
            // Every other method is treated as an event delivery
            .route(web::route().to(receive_webhook)),
    );
}

/// Handshake: echo the challenge iff a mode is given and the token matches
pub fn handshake_response(query: &VerifyQuery, expected_token: &str) -> Option<String> {
    let mode_present = query.mode.as_deref().is_some_and(|m| !m.is_empty());
    let token_matches = !expected_token.is_empty()
        && query.verify_token.as_deref() == Some(expected_token);

    if mode_present && token_matches {
        Some(query.challenge.clone().unwrap_or_default())
    } else {
        None
    }
}

async fn verify_webhook(
    state: web::Data<AppState>,
    query: Result<web::Query<VerifyQuery>, actix_web::Error>,
) -> impl Responder {
    let query = match query {
        Ok(query) => query,
        Err(e) => {
            log::warn!("[WEBHOOK] Verification failed (malformed query: {})", e);
            return HttpResponse::Forbidden().body("Verification failed");
        }
    };

    match handshake_response(&query, &state.config.verify_token) {
        Some(challenge) => {
            log::info!("[WEBHOOK] Verification succeeded (mode={:?})", query.mode);
            HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(challenge)
        }
        None => {
            log::warn!("[WEBHOOK] Verification failed (mode={:?})", query.mode);
            HttpResponse::Forbidden().body("Verification failed")
        }
    }
}

async fn receive_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    if state.config.verify_webhook_signature {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok());
        if !verify_signature(&state.config.app_secret, &body, header) {
            log::warn!("[WEBHOOK] Rejected delivery with missing or invalid signature");
            return HttpResponse::Forbidden().body("Invalid signature");
        }
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!(
                "[WEBHOOK] Invalid JSON payload ({}): {}",
                e,
                String::from_utf8_lossy(&body)
            );
            return HttpResponse::BadRequest().body("Invalid JSON payload");
        }
    };

    // Run in its own task so a panic while handling one delivery
    // becomes a 500 instead of taking the worker down
    let dispatcher = state.dispatcher.clone();
    let task = tokio::spawn(async move { dispatcher.process_payload(&payload).await });

    match task.await {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(EVENT_RECEIVED),
        Err(e) => {
            log::error!(
                "[WEBHOOK] Processing failed ({}), payload: {}",
                e,
                String::from_utf8_lossy(&body)
            );
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}
