//! Minimal client for OpenAI-compatible chat completion endpoints (Groq by default)

use crate::ai::Message;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAICompatClient {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAICompatClient {
    pub fn new(api_key: &str, endpoint: &str, model: &str, timeout: Duration) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Only add auth header if API key is provided and not empty
        if !api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?;
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }

    /// Send the turns and return the top choice's text
    pub async fn generate_text(&self, messages: &[Message]) -> Result<String, String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        log::debug!(
            "[COMPLETION] Sending {} messages to {} with model {}",
            messages.len(),
            self.endpoint,
            self.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Completion request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(format!("Completion API error ({}): {}", status, error_response.error.message));
            }

            return Err(format!(
                "Completion API returned error status: {}, body: {}",
                status, error_text
            ));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read completion response: {}", e))?;

        let response_data: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse completion response: {} - body: {}", e, response_text))?;

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "Completion API returned no choices".to_string())?;

        choice
            .message
            .content
            .ok_or_else(|| "Completion API returned an empty message".to_string())
    }
}
