use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};

use crate::attribution::{deep_link, Attribution};
use crate::config::Config;

const OPEN_APP_LABEL: &str = "🚀 Open the app";

/// The /start button: an attributed startapp deep link when startapp
/// links are enabled and the attribution is worth carrying, the generic
/// WebApp button otherwise.
pub fn mini_app_keyboard(config: &Config, attribution: &Attribution) -> InlineKeyboardMarkup {
    if config.mini_app_startapp_enabled && attribution.has_actionable_attribution() {
        let token = attribution.encode();
        let link = deep_link(&config.bot_username, &token);
        if let Ok(url) = link.parse() {
            return InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
                OPEN_APP_LABEL,
                url,
            )]]);
        }
    }
    web_app_keyboard(config)
}

pub fn web_app_keyboard(config: &Config) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
        OPEN_APP_LABEL,
        WebAppInfo {
            url: config.mini_app_url.clone(),
        },
    )]])
}
