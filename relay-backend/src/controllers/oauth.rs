use actix_web::{http::header, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::graph::oauth::authorize_url;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/connect").route(web::get().to(connect)));
    cfg.service(web::resource("/facebook/callback").route(web::get().to(facebook_callback)));
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

async fn connect(state: web::Data<AppState>) -> impl Responder {
    let config = &state.config;
    match authorize_url(
        &config.dialog_base,
        &config.api_version,
        &config.app_id,
        &config.redirect_uri,
    ) {
        Ok(url) => redirect(&url),
        Err(e) => {
            log::error!("[OAUTH] {}", e);
            HttpResponse::InternalServerError().body("OAuth is not configured")
        }
    }
}

async fn facebook_callback(
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> impl Responder {
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        if let Some(error) = &query.error {
            log::warn!(
                "[OAUTH] Login dialog returned error {}: {}",
                error,
                query.error_description.as_deref().unwrap_or("")
            );
        }
        return HttpResponse::BadRequest().body("No code returned");
    };

    let config = &state.config;
    let user_token = match state
        .graph
        .exchange_code(&config.app_id, &config.app_secret, &config.redirect_uri, code)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            log::error!("[OAUTH] Code exchange failed: {}", e);
            return HttpResponse::BadGateway().body("Failed to exchange code");
        }
    };

    let pages = match state.graph.list_pages(&user_token).await {
        Ok(pages) => pages,
        Err(e) => {
            log::error!("[OAUTH] Page listing failed: {}", e);
            return HttpResponse::BadGateway().body("Failed to list pages");
        }
    };

    let Some(page) = pages.into_iter().next() else {
        log::warn!("[OAUTH] User manages no pages, nothing connected");
        return redirect("/");
    };

    if let Err(e) = state
        .db
        .upsert_page_credential(&page.id, &page.name, &page.access_token, false)
    {
        log::error!("[OAUTH] Failed to save page {}: {}", page.id, e);
        return HttpResponse::InternalServerError().body("Failed to save page");
    }
    log::info!("[OAUTH] Connected page {} ({})", page.name, page.id);

    if config.subscribe_page_webhooks {
        match state.graph.subscribe_page(&page.id, &page.access_token).await {
            Ok(subscribed) => {
                if let Err(e) = state.db.set_page_subscribed(&page.id, subscribed) {
                    log::error!("[OAUTH] Failed to record subscription for {}: {}", page.id, e);
                }
                log::info!("[OAUTH] Page {} webhook subscription: {}", page.id, subscribed);
            }
            // The page stays connected; subscription can be fixed in the app dashboard
            Err(e) => log::warn!("[OAUTH] Failed to subscribe page {}: {}", page.id, e),
        }
    }

    redirect("/")
}
