use teloxide::{dptree, prelude::*, types::Update};
use tracing::{error, info};

pub mod handlers;
pub mod keyboards;

pub async fn run_bot(bot: Bot, state: crate::AppState) {
    info!("Starting bot dispatcher...");

    match bot.get_me().await {
        Ok(me) => {
            let username = me.username.clone().unwrap_or_else(|| "unknown".into());
            info!("Bot connected as: @{}", username);
        }
        Err(e) => {
            error!("CRITICAL: Bot failed to connect to Telegram: {}", e);
            // Usually an invalid token; a dispatcher would just spin.
            return;
        }
    }

    let message_handler = Update::filter_message().endpoint(handlers::command::message_handler);
    let pre_checkout_handler =
        Update::filter_pre_checkout_query().endpoint(handlers::payment::pre_checkout_handler);

    Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(message_handler)
            .branch(pre_checkout_handler),
    )
    .dependencies(dptree::deps![state])
    .default_handler(|upd: std::sync::Arc<Update>| async move {
        info!("Unhandled update: {:?}", upd);
    })
    .build()
    .dispatch()
    .await;
}
