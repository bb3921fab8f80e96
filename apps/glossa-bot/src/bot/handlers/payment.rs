use teloxide::prelude::*;
use teloxide::types::PreCheckoutQuery;
use tracing::{error, info, warn};

use crate::models::events::{PreCheckoutEvent, SuccessfulPaymentEvent};
use crate::AppState;

/// Answers a pre-checkout query, exactly once, within the platform's
/// response window. The decision itself is pure and synchronous; nothing
/// here touches the network before the answer goes out.
pub async fn pre_checkout_handler(
    bot: Bot,
    q: PreCheckoutQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let event = PreCheckoutEvent::from_query(&q);
    let decision = state
        .pay_service
        .decide_pre_checkout(&event.currency, event.total_amount);

    if decision.approved {
        info!(
            "Approving pre-checkout for user {} ({} {})",
            event.user_id, event.total_amount, event.currency
        );
        bot.answer_pre_checkout_query(q.id, true).await?;
    } else {
        let reason = decision
            .reason
            .unwrap_or_else(|| "A technical error occurred, please try again later.".to_string());
        warn!(
            "Rejecting pre-checkout for user {}: {}",
            event.user_id, reason
        );
        bot.answer_pre_checkout_query(q.id, false)
            .error_message(reason)
            .await?;
    }
    Ok(())
}

/// Handles the confirmation Telegram sends after the money moved. The
/// user always gets the confirmation reply; channel logging is detached
/// and its failure stays in the logs.
pub async fn successful_payment_handler(
    bot: Bot,
    chat_id: ChatId,
    event: SuccessfulPaymentEvent,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    info!(
        "Processing successful Stars payment: {} {} (user {}, charge {})",
        event.total_amount, event.currency, event.user_id, event.telegram_charge_id
    );

    let payment = state.pay_service.on_successful_payment(&event);

    let logger = state.channel_log.clone();
    let ledger_entry = payment.clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log_payment(&ledger_entry).await {
            error!(
                "Failed to log payment {} to channel: {:#}",
                ledger_entry.payment_id, e
            );
        }
    });

    bot.send_message(
        chat_id,
        format!(
            "✅ Payment of {} ⭐️ received, thank you! Your access is now active.",
            payment.amount
        ),
    )
    .await?;
    Ok(())
}
