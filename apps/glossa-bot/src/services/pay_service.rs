use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::models::events::SuccessfulPaymentEvent;
use crate::models::payment::{PaymentEvent, ValidationError, STARS_CURRENCY};
use glossa_shared::api::{InvoiceRequest, UtmParams};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PayError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Invoice parameters submitted to the gateway after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StarsInvoice {
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub payload: String,
    pub photo_url: Option<String>,
}

/// Seam to the Telegram payment gateway, mockable in tests.
#[async_trait]
pub trait StarsGateway: Send + Sync {
    async fn create_invoice_link(&self, invoice: &StarsInvoice) -> Result<String, GatewayError>;
    async fn refund_star_payment(&self, user_id: i64, charge_id: &str)
        -> Result<(), GatewayError>;
}

/// Production gateway talking straight to the Bot API payment methods.
pub struct TelegramGateway {
    client: reqwest::Client,
    bot_token: String,
}

impl TelegramGateway {
    pub fn new(bot_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }
}

#[derive(Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[async_trait]
impl StarsGateway for TelegramGateway {
    async fn create_invoice_link(&self, invoice: &StarsInvoice) -> Result<String, GatewayError> {
        // Stars constraints: empty provider token, a literal Stars count
        // (never x100 like minor-unit currencies), no flexible pricing and
        // no tips.
        let mut params = serde_json::json!({
            "title": invoice.title,
            "description": invoice.description,
            "payload": invoice.payload,
            "provider_token": "",
            "currency": STARS_CURRENCY,
            "prices": [{"label": invoice.title, "amount": invoice.amount}],
        });
        if let Some(photo_url) = &invoice.photo_url {
            params["photo_url"] = serde_json::Value::String(photo_url.clone());
        }

        let res = self
            .client
            .post(self.method_url("createInvoiceLink"))
            .json(&params)
            .send()
            .await?;
        let tg_res: TgResponse<String> = res.json().await?;

        match tg_res.result {
            Some(link) if tg_res.ok => Ok(link),
            _ => Err(GatewayError::Rejected(
                tg_res
                    .description
                    .unwrap_or_else(|| "unknown gateway error".to_string()),
            )),
        }
    }

    async fn refund_star_payment(
        &self,
        user_id: i64,
        charge_id: &str,
    ) -> Result<(), GatewayError> {
        let params = serde_json::json!({
            "user_id": user_id,
            "telegram_payment_charge_id": charge_id,
        });

        let res = self
            .client
            .post(self.method_url("refundStarPayment"))
            .json(&params)
            .send()
            .await?;
        let tg_res: TgResponse<bool> = res.json().await?;

        if tg_res.ok {
            Ok(())
        } else {
            Err(GatewayError::Rejected(
                tg_res
                    .description
                    .unwrap_or_else(|| "unknown gateway error".to_string()),
            ))
        }
    }
}

/// Approval verdict for a pre-checkout query. Must be produced exactly
/// once per query, the platform fails the payment on silence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreCheckoutDecision {
    pub approved: bool,
    pub reason: Option<String>,
}

impl PreCheckoutDecision {
    fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Structured metadata optionally smuggled through the opaque invoice
/// payload. Parsed best-effort on payment success.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadMeta {
    utm: Option<UtmParams>,
    promo_id: Option<String>,
    registration_time: Option<DateTime<Utc>>,
}

/// Drives the Telegram Stars payment protocol: invoice creation,
/// pre-checkout approval, success handling and refunds.
#[derive(Clone)]
pub struct PayService {
    gateway: Arc<dyn StarsGateway>,
}

impl PayService {
    pub fn new(gateway: Arc<dyn StarsGateway>) -> Self {
        Self { gateway }
    }

    /// Validates the request and asks the gateway for an invoice link.
    /// Invalid requests fail fast and never reach the network; gateway
    /// rejections are terminal, there is no automatic retry.
    pub async fn create_invoice(&self, req: &InvoiceRequest) -> Result<String, PayError> {
        let user_id = req.user_id.ok_or(ValidationError::MissingField("userId"))?;
        let title = req
            .product_name
            .clone()
            .ok_or(ValidationError::MissingField("productName"))?;
        let description = req
            .description
            .clone()
            .ok_or(ValidationError::MissingField("description"))?;
        let amount = req.amount.ok_or(ValidationError::MissingField("amount"))?;
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        if let Some(currency) = req.currency.as_deref() {
            if currency != STARS_CURRENCY {
                return Err(ValidationError::InvalidCurrency(currency.to_string()).into());
            }
        }

        let payload = req
            .payload
            .clone()
            .unwrap_or_else(|| format!("stars-{}-{}", user_id, Utc::now().timestamp_millis()));

        info!("Creating Stars invoice for user {}: {} XTR", user_id, amount);

        let invoice = StarsInvoice {
            title,
            description,
            amount,
            payload,
            photo_url: req.photo_url.clone(),
        };
        Ok(self.gateway.create_invoice_link(&invoice).await?)
    }

    /// Synchronous, infallible verdict: only Stars, only a positive
    /// amount. The handler answers the query with exactly this decision.
    pub fn decide_pre_checkout(&self, currency: &str, total_amount: i64) -> PreCheckoutDecision {
        if currency != STARS_CURRENCY {
            return PreCheckoutDecision::reject(format!(
                "Unsupported currency {currency}. Only Telegram Stars payments are accepted."
            ));
        }
        if total_amount < 1 {
            return PreCheckoutDecision::reject("Payment amount must be at least 1 Star.");
        }
        PreCheckoutDecision::approve()
    }

    /// Builds the ledger event for a confirmed payment. The correlation
    /// payload may carry attribution and the original registration time;
    /// when it does not, both instants collapse to now and the time to
    /// payment reads as zero.
    pub fn on_successful_payment(&self, event: &SuccessfulPaymentEvent) -> PaymentEvent {
        let meta = parse_payload_meta(&event.invoice_payload);
        let now = Utc::now();
        let registration_time = meta.registration_time.unwrap_or(now);

        PaymentEvent {
            user_id: event.user_id,
            username: None,
            first_name: None,
            last_name: None,
            payment_id: event.telegram_charge_id.clone(),
            amount: event.total_amount,
            currency: event.currency.clone(),
            registration_time,
            payment_time: now,
            time_to_payment_ms: (now - registration_time).num_milliseconds().max(0),
            utm: meta.utm,
            promo_id: meta.promo_id,
        }
    }

    /// Fire-and-forget administrative refund keyed by charge id. No local
    /// record is kept; a gateway failure is logged and reported as false.
    pub async fn refund(&self, user_id: i64, charge_id: &str, reason: Option<&str>) -> bool {
        info!(
            "Issuing Stars refund for charge {} (user {}, reason: {})",
            charge_id,
            user_id,
            reason.unwrap_or("none")
        );
        match self.gateway.refund_star_payment(user_id, charge_id).await {
            Ok(()) => true,
            Err(e) => {
                error!("Stars refund failed for charge {}: {}", charge_id, e);
                false
            }
        }
    }
}

fn parse_payload_meta(payload: &str) -> PayloadMeta {
    if payload.trim().is_empty() {
        return PayloadMeta::default();
    }
    match serde_json::from_str(payload) {
        Ok(meta) => meta,
        Err(e) => {
            // Locally generated payloads are plain correlation ids, so a
            // non-JSON payload is an expected case, not an error.
            debug!("Invoice payload carries no structured metadata: {}", e);
            PayloadMeta::default()
        }
    }
}
