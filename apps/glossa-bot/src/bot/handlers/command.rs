use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info};

use crate::attribution::Attribution;
use crate::bot::handlers::payment;
use crate::bot::keyboards;
use crate::models::events::{MessageEvent, StartEvent, TextMessageEvent};
use crate::services::logging_service::UserStartLog;
use crate::AppState;
use glossa_shared::api::LeadRequest;

const WELCOME_TEXT: &str = "Welcome to the <b>English practice</b> bot!\n\n\
    Learn English with bite-sized lessons, audio and transliteration. \
    20 phrases in 7 days, the first lesson is free!";

const HELP_TEXT: &str = "ℹ️ <b>Help</b>\n\n\
    This bot teaches English through the Mini App.\n\n\
    <b>Commands:</b>\n\
    • /start — start learning\n\
    • /help — show this message\n\n\
    Tap the button below to open the app:";

const HINT_TEXT: &str = "Use /start to begin or /help for more information.";

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    match MessageEvent::classify(&msg) {
        MessageEvent::Start(event) => handle_start(bot, chat_id, event, state).await,
        MessageEvent::Help => handle_help(bot, chat_id, state).await,
        MessageEvent::SuccessfulPayment(event) => {
            payment::successful_payment_handler(bot, chat_id, event, state).await
        }
        MessageEvent::Text(event) => handle_text(bot, chat_id, event, state).await,
        MessageEvent::Unknown => handle_hint(bot, chat_id, state).await,
    }
}

async fn handle_start(
    bot: Bot,
    chat_id: ChatId,
    event: StartEvent,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    info!(
        "Processing /start for user {} (payload: {:?})",
        event.user_id, event.payload
    );

    let attribution = Attribution::decode(&event.payload);
    let is_first_time = state.first_touch.observe(event.user_id).await;

    // Lead submission and channel logging run detached; the welcome
    // message goes out regardless of how they end.
    let lead = LeadRequest {
        user_id: event.user_id,
        utm: attribution.utm.clone(),
        promo_id: attribution.promo_id.clone(),
    };
    let api = state.api.clone();
    tokio::spawn(async move {
        if let Err(e) = api.send_lead(&lead).await {
            error!("Failed to send lead for user {}: {:#}", lead.user_id, e);
        }
    });

    let entry = UserStartLog {
        user_id: event.user_id,
        username: event.username,
        first_name: event.first_name,
        last_name: event.last_name,
        language_code: event.language_code,
        utm: attribution.utm.clone(),
        promo_id: attribution.promo_id.clone(),
        is_first_time,
        timestamp: Utc::now(),
    };
    let logger = state.channel_log.clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log_user_start(&entry).await {
            error!(
                "Failed to log user start to channel (user {}): {:#}",
                entry.user_id, e
            );
        }
    });

    let keyboard = keyboards::mini_app_keyboard(&state.config, &attribution);
    bot.send_message(chat_id, WELCOME_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn handle_help(
    bot: Bot,
    chat_id: ChatId,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    bot.send_message(chat_id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::web_app_keyboard(&state.config))
        .await?;
    Ok(())
}

async fn handle_text(
    bot: Bot,
    chat_id: ChatId,
    event: TextMessageEvent,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    if let Some(args) = event.text.strip_prefix("/refund") {
        if state.config.admin_chat_id == Some(event.user_id) {
            return handle_refund(bot, chat_id, args.trim(), state).await;
        }
        // Non-admins get the same generic hint as any other text.
    }

    info!("Unknown message from user {}", event.user_id);
    handle_hint(bot, chat_id, state).await
}

/// `/refund <user_id> <charge_id> [reason...]`, admin chat only.
async fn handle_refund(
    bot: Bot,
    chat_id: ChatId,
    args: &str,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let Some((user_id, charge_id, reason)) = parse_refund_args(args) else {
        bot.send_message(chat_id, "Usage: /refund <user_id> <charge_id> [reason]")
            .await?;
        return Ok(());
    };

    let refunded = state
        .pay_service
        .refund(user_id, &charge_id, reason.as_deref())
        .await;

    let reply = if refunded {
        format!("✅ Refund issued for charge <code>{}</code>.", charge_id)
    } else {
        format!(
            "❌ Refund failed for charge <code>{}</code>, see the logs.",
            charge_id
        )
    };
    bot.send_message(chat_id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

fn parse_refund_args(args: &str) -> Option<(i64, String, Option<String>)> {
    let mut parts = args.split_whitespace();
    let user_id = parts.next()?.parse::<i64>().ok()?;
    let charge_id = parts.next()?.to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    let reason = (!rest.is_empty()).then_some(rest);
    Some((user_id, charge_id, reason))
}

async fn handle_hint(
    bot: Bot,
    chat_id: ChatId,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    bot.send_message(chat_id, HINT_TEXT)
        .reply_markup(keyboards::web_app_keyboard(&state.config))
        .await?;
    Ok(())
}
