use serde::Serialize;
use teloxide::types::{Message, PreCheckoutQuery};

/// Inbound message activity, reduced to the fields the handlers actually
/// use. Built once per update and dispatched by exhaustive match instead
/// of probing the raw update shape in every handler.
#[derive(Debug, Clone)]
pub enum MessageEvent {
    Start(StartEvent),
    Help,
    Text(TextMessageEvent),
    SuccessfulPayment(SuccessfulPaymentEvent),
    Unknown,
}

#[derive(Debug, Clone)]
pub struct StartEvent {
    pub user_id: i64,
    pub payload: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TextMessageEvent {
    pub user_id: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SuccessfulPaymentEvent {
    pub user_id: i64,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
    pub telegram_charge_id: String,
}

#[derive(Debug, Clone)]
pub struct PreCheckoutEvent {
    pub user_id: i64,
    pub currency: String,
    pub total_amount: i64,
}

impl MessageEvent {
    pub fn classify(msg: &Message) -> Self {
        let user_id = msg.chat.id.0;

        if let Some(payment) = msg.successful_payment() {
            return Self::SuccessfulPayment(SuccessfulPaymentEvent {
                user_id,
                currency: wire_currency_code(&payment.currency),
                total_amount: i64::from(payment.total_amount),
                invoice_payload: payment.invoice_payload.clone(),
                telegram_charge_id: payment.telegram_payment_charge_id.clone(),
            });
        }

        let Some(text) = msg.text() else {
            return Self::Unknown;
        };

        if text == "/start" || text.starts_with("/start ") {
            let from = msg.from.as_ref();
            return Self::Start(StartEvent {
                user_id,
                payload: text
                    .strip_prefix("/start")
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
                username: from.and_then(|u| u.username.clone()),
                first_name: from.map(|u| u.first_name.clone()),
                last_name: from.and_then(|u| u.last_name.clone()),
                language_code: from.and_then(|u| u.language_code.clone()),
            });
        }

        if text.starts_with("/help") {
            return Self::Help;
        }

        Self::Text(TextMessageEvent {
            user_id,
            text: text.to_string(),
        })
    }
}

impl PreCheckoutEvent {
    pub fn from_query(q: &PreCheckoutQuery) -> Self {
        Self {
            user_id: q.from.id.0 as i64,
            currency: wire_currency_code(&q.currency),
            total_amount: i64::from(q.total_amount),
        }
    }
}

/// Currency fields arrive as their three-letter wire code; normalizing
/// through serde keeps this independent of the concrete field type.
fn wire_currency_code<C: Serialize>(currency: &C) -> String {
    match serde_json::to_value(currency) {
        Ok(serde_json::Value::String(code)) => code,
        _ => String::new(),
    }
}
