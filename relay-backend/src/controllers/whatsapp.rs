use actix_web::{http::header, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveWhatsappRequest {
    pub phone_id: Option<String>,
    pub token: Option<String>,
    pub display: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/save_whatsapp").route(web::post().to(save_whatsapp)));
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts the credential as JSON or as a submitted HTML form
async fn save_whatsapp(
    state: web::Data<AppState>,
    body: web::Either<web::Json<SaveWhatsappRequest>, web::Form<SaveWhatsappRequest>>,
) -> impl Responder {
    let request = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    let (Some(phone_id), Some(token)) = (non_blank(&request.phone_id), non_blank(&request.token)) else {
        return HttpResponse::BadRequest().body("phone_id and token required");
    };

    match state
        .db
        .upsert_whatsapp_credential(phone_id, token, non_blank(&request.display))
    {
        Ok(wa) => {
            log::info!("[WHATSAPP] Saved credential for phone number {}", wa.phone_number_id);
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/"))
                .finish()
        }
        Err(e) => {
            log::error!("[WHATSAPP] Failed to save credential: {}", e);
            HttpResponse::InternalServerError().body("Failed to save WhatsApp credential")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_save_from_json() {
        let (state, _, _) = test_state();
        let db = state.db.clone();
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/save_whatsapp")
            .set_json(json!({"phone_id": "P1", "token": "wa-token", "display": "+1 555 0100"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let wa = db.get_whatsapp_credential().unwrap().unwrap();
        assert_eq!(wa.phone_number_id, "P1");
        assert_eq!(wa.access_token, "wa-token");
        assert_eq!(wa.display_phone_number.as_deref(), Some("+1 555 0100"));
    }

    #[actix_web::test]
    async fn test_save_from_form_overwrites() {
        let (state, _, _) = test_state();
        state.db.upsert_whatsapp_credential("P1", "old", None).unwrap();
        let db = state.db.clone();
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/save_whatsapp")
            .set_form([("phone_id", "P1"), ("token", "new")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(db.get_whatsapp_credential().unwrap().unwrap().access_token, "new");
    }

    #[actix_web::test]
    async fn test_missing_fields_are_rejected() {
        let (state, _, _) = test_state();
        let db = state.db.clone();
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        for body in [
            json!({"phone_id": "P1"}),
            json!({"token": "tok"}),
            json!({"phone_id": "  ", "token": "tok"}),
            json!({}),
        ] {
            let req = test::TestRequest::post().uri("/save_whatsapp").set_json(&body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        }
        assert!(db.get_whatsapp_credential().unwrap().is_none());
    }
}
