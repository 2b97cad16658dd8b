use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const BANNER: &str = "Meta Chatbot running!";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)));
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
}

async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(BANNER)
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let messages = state.db.count_messages().unwrap_or_else(|e| {
        log::error!("Failed to count messages: {}", e);
        -1
    });
    let page_connected = state.db.get_page_credential().ok().flatten().is_some();
    let whatsapp_connected = state.db.get_whatsapp_credential().ok().flatten().is_some();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "messages": messages,
        "page_connected": page_connected,
        "whatsapp_connected": whatsapp_connected,
    }))
}
