use std::env;

use anyhow::{Context, Result};
use url::Url;

/// Process configuration, loaded once from the environment at startup and
/// passed around inside [`crate::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub bot_username: String,
    pub api_base_url: String,
    pub mini_app_url: Url,
    pub mini_app_startapp_enabled: bool,
    pub port: u16,
    pub log_channel_id: Option<String>,
    pub log_channel_enabled: bool,
    pub api_secret_key: Option<String>,
    pub payment_log_enabled: bool,
    pub admin_chat_id: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            bot_username: required("BOT_USERNAME")?,
            api_base_url: optional("API_BASE_URL")
                .unwrap_or_else(|| "https://glossa.app/api/v2".to_string()),
            // Parsed up front so button construction can never fail later.
            mini_app_url: required("MINI_APP_URL")?
                .parse()
                .context("MINI_APP_URL must be a valid URL")?,
            mini_app_startapp_enabled: flag("MINI_APP_STARTAPP_ENABLED", true),
            port: required("PORT")?
                .parse()
                .context("PORT must be a number")?,
            log_channel_id: optional("LOG_CHANNEL_ID"),
            log_channel_enabled: flag("LOG_CHANNEL_ENABLED", true),
            api_secret_key: optional("API_SECRET_KEY"),
            payment_log_enabled: flag("PAYMENT_LOG_ENABLED", true),
            admin_chat_id: optional("ADMIN_CHAT_ID").and_then(|raw| raw.parse().ok()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Environment variable {name} is required"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => value.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}
