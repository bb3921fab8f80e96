use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api_client;
mod attribution;
mod bot;
mod config;
mod http;
mod models;
mod services;
mod state;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::services::first_touch::FirstTouchTracker;
use crate::services::logging_service::LoggingService;
use crate::services::pay_service::{PayService, TelegramGateway};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glossa_bot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting glossa-bot...");
    tracing::info!("Bot username: @{}", config.bot_username);
    tracing::info!("Backend API: {}", config.api_base_url);
    tracing::info!("Mini App: {}", config.mini_app_url);

    let bot = Bot::new(config.bot_token.clone());

    let api = ApiClient::new(config.api_base_url.clone());
    let pay_service = PayService::new(Arc::new(TelegramGateway::new(config.bot_token.clone())));
    let channel_log = LoggingService::new(
        bot.clone(),
        config.log_channel_id.as_deref(),
        config.log_channel_enabled,
    );
    let first_touch = FirstTouchTracker::new();

    let state = AppState {
        config,
        api,
        first_touch,
        pay_service,
        channel_log,
    };

    if state.api.health_check().await {
        tracing::info!("Backend health check passed");
    } else {
        tracing::warn!("Backend health check failed, continuing anyway");
    }

    if state.channel_log.is_enabled() {
        if state.channel_log.probe_channel().await {
            tracing::info!("Channel test passed, logging enabled");
        } else {
            tracing::warn!("Channel test failed, channel logging may not work");
        }
    } else {
        tracing::info!("Channel logging disabled");
    }

    let http_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = http::serve(http_state).await {
            tracing::error!("HTTP server exited: {:#}", e);
        }
    });

    bot::run_bot(bot, state).await;
    Ok(())
}
