//! Meta Graph API plumbing shared by the OAuth flow and the platform senders

pub mod oauth;

use reqwest::{Client, Response};
use std::time::Duration;

use crate::config::Config;

#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl GraphClient {
    pub fn new(base_url: &str, api_version: &str, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, String> {
        Self::new(
            &config.graph_api_base,
            &config.api_version,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Versioned endpoint URL, e.g. `/me/messages` -> `{base}/v19.0/me/messages`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }
}

/// Format a transport error without its URL, which can carry access tokens
pub(crate) fn request_failed(context: &str, error: reqwest::Error) -> String {
    format!("{} request failed: {}", context, error.without_url())
}

/// Turn a non-2xx response into an error carrying status and body
pub(crate) async fn error_for_status(response: Response, context: &str) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("{} returned {}: {}", context, status, body))
}
