//! Facebook Login flow used to connect a Messenger page

use serde::Deserialize;
use url::Url;

use super::{error_for_status, request_failed, GraphClient};

pub const OAUTH_SCOPE: &str =
    "pages_show_list,pages_messaging,whatsapp_business_messaging,business_management";

/// Webhook fields the connected page is subscribed to
pub const PAGE_SUBSCRIBED_FIELDS: &str = "messages,messaging_postbacks";

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphPage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    data: Vec<GraphPage>,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    #[serde(default)]
    success: bool,
}

/// The login dialog URL users are redirected to from `/connect`
pub fn authorize_url(
    dialog_base: &str,
    api_version: &str,
    app_id: &str,
    redirect_uri: &str,
) -> Result<String, String> {
    let base = format!(
        "{}/{}/dialog/oauth",
        dialog_base.trim_end_matches('/'),
        api_version
    );
    let url = Url::parse_with_params(
        &base,
        &[
            ("client_id", app_id),
            ("redirect_uri", redirect_uri),
            ("scope", OAUTH_SCOPE),
            ("response_type", "code"),
        ],
    )
    .map_err(|e| format!("Invalid OAuth dialog URL {}: {}", base, e))?;
    Ok(url.into())
}

impl GraphClient {
    /// Exchange an authorization code for a user access token
    pub async fn exchange_code(
        &self,
        app_id: &str,
        app_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> Result<String, String> {
        let response = self
            .http()
            .get(self.url("/oauth/access_token"))
            .query(&[
                ("client_id", app_id),
                ("redirect_uri", redirect_uri),
                ("client_secret", app_secret),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Token exchange", e))?;

        let token: AccessTokenResponse = error_for_status(response, "Token exchange")
            .await?
            .json()
            .await
            .map_err(|e| format!("Failed to parse token exchange response: {}", e.without_url()))?;

        Ok(token.access_token)
    }

    /// Pages the user manages, each with its own page token
    pub async fn list_pages(&self, user_token: &str) -> Result<Vec<GraphPage>, String> {
        let response = self
            .http()
            .get(self.url("/me/accounts"))
            .query(&[("access_token", user_token)])
            .send()
            .await
            .map_err(|e| request_failed("Page listing", e))?;

        let pages: PagesResponse = error_for_status(response, "Page listing")
            .await?
            .json()
            .await
            .map_err(|e| format!("Failed to parse page listing: {}", e.without_url()))?;

        Ok(pages.data)
    }

    /// Subscribe our app to the page's message webhooks
    pub async fn subscribe_page(&self, page_id: &str, page_token: &str) -> Result<bool, String> {
        let response = self
            .http()
            .post(self.url(&format!("/{}/subscribed_apps", page_id)))
            .query(&[
                ("subscribed_fields", PAGE_SUBSCRIBED_FIELDS),
                ("access_token", page_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Page subscription", e))?;

        let result: SuccessResponse = error_for_status(response, "Page subscription")
            .await?
            .json()
            .await
            .map_err(|e| format!("Failed to parse page subscription response: {}", e.without_url()))?;

        Ok(result.success)
    }
}
