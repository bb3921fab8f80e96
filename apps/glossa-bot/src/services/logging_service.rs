use anyhow::Result;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use tracing::{info, warn};

use crate::models::payment::{humanize_duration, PaymentCreationLog, PaymentEvent};
use glossa_shared::api::UtmParams;

/// One observed /start, ready for the admin channel.
#[derive(Debug, Clone)]
pub struct UserStartLog {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub utm: UtmParams,
    pub promo_id: Option<String>,
    pub is_first_time: bool,
    pub timestamp: DateTime<Utc>,
}

/// Mirrors user activity and payments into an admin Telegram channel.
/// Every call site treats failures as log-and-continue: the channel is an
/// observability sink, never part of the user-facing path.
#[derive(Clone)]
pub struct LoggingService {
    bot: Bot,
    channel: Option<Recipient>,
    enabled: bool,
}

impl LoggingService {
    pub fn new(bot: Bot, channel_id: Option<&str>, enabled: bool) -> Self {
        let channel = channel_id.map(parse_recipient);
        let enabled = enabled && channel.is_some();
        info!("Channel logger initialized (enabled: {})", enabled);
        Self {
            bot,
            channel,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Silent connectivity probe, used once at startup.
    pub async fn probe_channel(&self) -> bool {
        let Some(channel) = self.channel_if_enabled() else {
            return false;
        };
        match self
            .bot
            .send_message(channel, "🧪 Channel logging connectivity test")
            .disable_notification(true)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!("Channel test failed: {}", e);
                false
            }
        }
    }

    pub async fn log_user_start(&self, entry: &UserStartLog) -> Result<()> {
        let Some(channel) = self.channel_if_enabled() else {
            return Ok(());
        };
        self.bot
            .send_message(channel, format_user_start(entry))
            .parse_mode(ParseMode::Html)
            .await?;
        info!(
            "User start logged to channel (user {}, first time: {})",
            entry.user_id, entry.is_first_time
        );
        Ok(())
    }

    pub async fn log_payment(&self, event: &PaymentEvent) -> Result<()> {
        let Some(channel) = self.channel_if_enabled() else {
            return Ok(());
        };
        self.bot
            .send_message(channel, format_payment(event))
            .parse_mode(ParseMode::Html)
            .await?;
        info!(
            "Payment {} logged to channel for user {}",
            event.payment_id, event.user_id
        );
        Ok(())
    }

    pub async fn log_payment_creation(&self, entry: &PaymentCreationLog) -> Result<()> {
        let Some(channel) = self.channel_if_enabled() else {
            return Ok(());
        };
        self.bot
            .send_message(channel, format_payment_creation(entry))
            .parse_mode(ParseMode::Html)
            .await?;
        info!(
            "Payment creation {} logged to channel for user {}",
            entry.payment_id, entry.user_id
        );
        Ok(())
    }

    fn channel_if_enabled(&self) -> Option<Recipient> {
        if !self.enabled {
            return None;
        }
        self.channel.clone()
    }
}

/// Channel ids come either as numeric chat ids or as @usernames.
fn parse_recipient(raw: &str) -> Recipient {
    match raw.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(raw.to_string()),
    }
}

fn format_user_start(entry: &UserStartLog) -> String {
    let (emoji, status) = if entry.is_first_time {
        ("🆕", "New user")
    } else {
        ("🔄", "Returning user")
    };
    let language = entry
        .language_code
        .as_deref()
        .map(|code| format!(", {code}"))
        .unwrap_or_default();

    format!(
        "{emoji} <b>{status}</b>\n\n\
         👤 <b>User:</b> {} ({}{})\n\
         🆔 <b>ID:</b> <code>{}</code>\n\
         📊 <b>UTM:</b> {}{}\n\
         🕒 <b>Time:</b> {} (UTC)",
        escape_html(&display_name(
            entry.first_name.as_deref(),
            entry.last_name.as_deref()
        )),
        escape_html(&handle(entry.username.as_deref())),
        language,
        entry.user_id,
        format_utm(&entry.utm),
        promo_line(entry.promo_id.as_deref()),
        entry.timestamp.format("%Y-%m-%d %H:%M"),
    )
}

fn format_payment(event: &PaymentEvent) -> String {
    format!(
        "💰 <b>New payment</b>\n\n\
         👤 <b>User:</b> {} ({})\n\
         🆔 <b>ID:</b> <code>{}</code>\n\
         💳 <b>Payment:</b> {} {}\n\
         🆔 <b>Payment ID:</b> <code>{}</code>\n\
         ⏱️ <b>Time to payment:</b> {}\n\
         📊 <b>UTM:</b> {}{}\n\n\
         📅 <b>Registered:</b> {} (UTC)\n\
         💳 <b>Paid:</b> {} (UTC)",
        escape_html(&display_name(
            event.first_name.as_deref(),
            event.last_name.as_deref()
        )),
        escape_html(&handle(event.username.as_deref())),
        event.user_id,
        event.amount,
        escape_html(&event.currency.to_uppercase()),
        escape_html(&event.payment_id),
        humanize_duration(event.time_to_payment_ms),
        format_utm(event.utm.as_ref().unwrap_or(&UtmParams::default())),
        promo_line(event.promo_id.as_deref()),
        event.registration_time.format("%Y-%m-%d %H:%M"),
        event.payment_time.format("%Y-%m-%d %H:%M"),
    )
}

fn format_payment_creation(entry: &PaymentCreationLog) -> String {
    let tariff_line = entry
        .tariff_name
        .as_deref()
        .map(|name| format!("\n📦 <b>Tariff:</b> {}", escape_html(name)))
        .unwrap_or_default();

    format!(
        "🧾 <b>Payment initiated</b>\n\n\
         👤 <b>User:</b> {} ({})\n\
         🆔 <b>ID:</b> <code>{}</code>\n\
         💳 <b>Amount:</b> {} {}{}\n\
         🆔 <b>Payment ID:</b> <code>{}</code>\n\
         📊 <b>UTM:</b> {}{}\n\
         🕒 <b>Time:</b> {} (UTC)",
        escape_html(&display_name(
            entry.first_name.as_deref(),
            entry.last_name.as_deref()
        )),
        escape_html(&handle(entry.username.as_deref())),
        entry.user_id,
        entry.amount,
        escape_html(&entry.currency.to_uppercase()),
        tariff_line,
        escape_html(&entry.payment_id),
        format_utm(entry.utm.as_ref().unwrap_or(&UtmParams::default())),
        promo_line(entry.promo_id.as_deref()),
        entry.timestamp.format("%Y-%m-%d %H:%M"),
    )
}

fn display_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let name = [first_name, last_name]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        "No name".to_string()
    } else {
        name
    }
}

fn handle(username: Option<&str>) -> String {
    username
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "no username".to_string())
}

fn format_utm(utm: &UtmParams) -> String {
    let labeled = [
        ("source", &utm.utm_source),
        ("campaign", &utm.utm_campaign),
        ("medium", &utm.utm_medium),
        ("term", &utm.utm_term),
        ("content", &utm.utm_content),
    ];

    let parts: Vec<String> = labeled
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(|v| format!("{}: {}", label, escape_html(v)))
        })
        .collect();

    if parts.is_empty() {
        "no UTM".to_string()
    } else {
        parts.join(", ")
    }
}

fn promo_line(promo_id: Option<&str>) -> String {
    promo_id
        .map(|p| format!("\n🎫 <b>Promo:</b> {}", escape_html(p)))
        .unwrap_or_default()
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::STARS_CURRENCY;

    fn start_entry() -> UserStartLog {
        UserStartLog {
            user_id: 42,
            username: Some("aldar".to_string()),
            first_name: Some("Aldar".to_string()),
            last_name: None,
            language_code: Some("en".to_string()),
            utm: UtmParams {
                utm_source: Some("ads".to_string()),
                utm_campaign: Some("spring".to_string()),
                ..Default::default()
            },
            promo_id: Some("WINTER".to_string()),
            is_first_time: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn user_start_message_distinguishes_first_time_from_repeat() {
        let mut entry = start_entry();
        assert!(format_user_start(&entry).contains("New user"));
        entry.is_first_time = false;
        assert!(format_user_start(&entry).contains("Returning user"));
    }

    #[test]
    fn user_start_message_lists_utm_and_promo() {
        let rendered = format_user_start(&start_entry());
        assert!(rendered.contains("source: ads, campaign: spring"));
        assert!(rendered.contains("Promo:</b> WINTER"));
    }

    #[test]
    fn payment_message_humanizes_the_time_to_payment() {
        let event = PaymentEvent {
            user_id: 42,
            username: None,
            first_name: Some("Aldar".to_string()),
            last_name: None,
            payment_id: "ch_1".to_string(),
            amount: 100,
            currency: STARS_CURRENCY.to_string(),
            registration_time: Utc::now(),
            payment_time: Utc::now(),
            time_to_payment_ms: 5_400_000,
            utm: None,
            promo_id: None,
        };
        let rendered = format_payment(&event);
        assert!(rendered.contains("1h 30m"));
        assert!(rendered.contains("100 XTR"));
        assert!(rendered.contains("no UTM"));
    }

    #[test]
    fn html_sensitive_names_are_escaped() {
        let mut entry = start_entry();
        entry.first_name = Some("<b>Aldar & co</b>".to_string());
        let rendered = format_user_start(&entry);
        assert!(rendered.contains("&lt;b&gt;Aldar &amp; co&lt;/b&gt;"));
    }

    #[test]
    fn recipients_parse_as_ids_or_usernames() {
        assert!(matches!(
            parse_recipient("-1001234567890"),
            Recipient::Id(ChatId(-1001234567890))
        ));
        assert!(matches!(
            parse_recipient("@glossa_logs"),
            Recipient::ChannelUsername(name) if name == "@glossa_logs"
        ));
    }
}
