use std::env;
use std::str::FromStr;

pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_DIALOG_BASE: &str = "https://www.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v19.0";

#[derive(Clone, Debug)]
pub struct Config {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    pub verify_token: String,
    pub completion_api_key: String,
    pub completion_endpoint: String,
    pub completion_model: String,
    pub system_prompt: String,
    /// Turns kept per conversation; 0 disables rolling memory
    pub chat_memory_turns: usize,
    pub api_version: String,
    pub graph_api_base: String,
    pub dialog_base: String,
    pub port: u16,
    pub base_url: String,
    pub database_url: String,
    pub http_timeout_secs: u64,
    pub subscribe_page_webhooks: bool,
    pub verify_webhook_signature: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = parse_or("PORT", 3000);
        let base_url = var_or("BASE_URL", &format!("http://localhost:{}", port));
        let redirect_uri = var_or(
            "FB_REDIRECT_URI",
            &format!("{}/facebook/callback", base_url.trim_end_matches('/')),
        );

        let config = Self {
            app_id: var_or("FB_APP_ID", ""),
            app_secret: var_or("FB_APP_SECRET", ""),
            redirect_uri,
            verify_token: var_or("VERIFY_TOKEN", ""),
            completion_api_key: var_or("GROQ_API_KEY", ""),
            completion_endpoint: var_or("COMPLETION_ENDPOINT", DEFAULT_COMPLETION_ENDPOINT),
            completion_model: var_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            system_prompt: var_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            chat_memory_turns: parse_or("CHAT_MEMORY_TURNS", 10),
            api_version: var_or("FB_API_VERSION", DEFAULT_API_VERSION),
            graph_api_base: var_or("GRAPH_API_BASE", DEFAULT_GRAPH_API_BASE),
            dialog_base: var_or("FB_DIALOG_BASE", DEFAULT_DIALOG_BASE),
            port,
            base_url,
            database_url: var_or("DATABASE_URL", "./data.sqlite"),
            http_timeout_secs: parse_nonzero_or("HTTP_TIMEOUT_SECS", 30),
            subscribe_page_webhooks: parse_bool_or("SUBSCRIBE_PAGE_WEBHOOKS", true),
            verify_webhook_signature: parse_bool_or("VERIFY_WEBHOOK_SIGNATURE", false),
        };

        if config.verify_token.is_empty() {
            log::warn!("VERIFY_TOKEN is not set - webhook verification will always fail");
        }
        if config.completion_api_key.is_empty() {
            log::warn!("GROQ_API_KEY is not set - replies will fall back to the default message");
        }
        if config.verify_webhook_signature && config.app_secret.is_empty() {
            log::warn!("VERIFY_WEBHOOK_SIGNATURE is enabled but FB_APP_SECRET is empty - all webhook events will be rejected");
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            redirect_uri: "http://localhost:3000/facebook/callback".to_string(),
            verify_token: String::new(),
            completion_api_key: String::new(),
            completion_endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            chat_memory_turns: 10,
            api_version: DEFAULT_API_VERSION.to_string(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            dialog_base: DEFAULT_DIALOG_BASE.to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: "./data.sqlite".to_string(),
            http_timeout_secs: 30,
            subscribe_page_webhooks: true,
            verify_webhook_signature: false,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid value for {}: {:?}, using default", name, raw);
            default
        }),
        _ => default,
    }
}

/// Like `parse_or`, but zero counts as invalid
fn parse_nonzero_or(name: &str, default: u64) -> u64 {
    match parse_or(name, default) {
        0 => {
            log::warn!("{} must be greater than zero, using default {}", name, default);
            default
        }
        v => v,
    }
}

fn parse_bool_or(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            "" => default,
            _ => {
                log::warn!("Invalid boolean for {}: {:?}, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers_fall_back_on_garbage() {
        // Unique names so parallel tests never see each other's values
        unsafe {
            env::set_var("RELAY_TEST_PORT_GARBAGE", "not-a-port");
            env::set_var("RELAY_TEST_BOOL_GARBAGE", "maybe");
            env::set_var("RELAY_TEST_BOOL_OFF", "off");
        }

        assert_eq!(parse_or::<u16>("RELAY_TEST_PORT_GARBAGE", 3000), 3000);
        assert_eq!(parse_or::<u16>("RELAY_TEST_PORT_UNSET", 8080), 8080);
        assert!(parse_bool_or("RELAY_TEST_BOOL_GARBAGE", true));
        assert!(!parse_bool_or("RELAY_TEST_BOOL_OFF", true));
    }

    #[test]
    fn test_var_or_treats_blank_as_unset() {
        unsafe {
            env::set_var("RELAY_TEST_BLANK", "   ");
        }
        assert_eq!(var_or("RELAY_TEST_BLANK", "fallback"), "fallback");
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        unsafe {
            env::set_var("RELAY_TEST_TIMEOUT_ZERO", "0");
            env::set_var("RELAY_TEST_TIMEOUT_FIVE", "5");
        }
        assert_eq!(parse_nonzero_or("RELAY_TEST_TIMEOUT_ZERO", 30), 30);
        assert_eq!(parse_nonzero_or("RELAY_TEST_TIMEOUT_FIVE", 30), 5);
        assert_eq!(parse_nonzero_or("RELAY_TEST_TIMEOUT_UNSET", 30), 30);
    }
}
