use chrono::{DateTime, Utc};
use glossa_shared::api::{PaymentCreationLogRequest, PaymentLogRequest, UtmParams};
use thiserror::Error;

/// Telegram Stars currency code. Stars amounts are whole-unit counts, not
/// minor units, so they are never multiplied by 100.
pub const STARS_CURRENCY: &str = "XTR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid {0} format. Use ISO 8601")]
    InvalidTimestamp(&'static str),
    #[error("Payment time cannot be before registration time")]
    NegativeDuration,
    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),
    #[error("Amount must be a positive number")]
    NonPositiveAmount,
}

/// One confirmed payment, fully validated, with the time-to-payment
/// already derived. Forwarded to the channel logger and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub registration_time: DateTime<Utc>,
    pub payment_time: DateTime<Utc>,
    pub time_to_payment_ms: i64,
    pub utm: Option<UtmParams>,
    pub promo_id: Option<String>,
}

impl PaymentEvent {
    /// Checks every required field, parses both instants and derives the
    /// time to payment. Invariant: `payment_time >= registration_time`.
    pub fn validate_and_derive(req: &PaymentLogRequest) -> Result<Self, ValidationError> {
        let user_id = req.user_id.ok_or(ValidationError::MissingField("userId"))?;
        let payment_id = req
            .payment_id
            .clone()
            .ok_or(ValidationError::MissingField("paymentId"))?;
        let amount = req.amount.ok_or(ValidationError::MissingField("amount"))?;
        let currency = req
            .currency
            .clone()
            .ok_or(ValidationError::MissingField("currency"))?;
        let registration_raw = req
            .registration_time
            .as_deref()
            .ok_or(ValidationError::MissingField("registrationTime"))?;
        let payment_raw = req
            .payment_time
            .as_deref()
            .ok_or(ValidationError::MissingField("paymentTime"))?;

        let registration_time = parse_instant(registration_raw, "registrationTime")?;
        let payment_time = parse_instant(payment_raw, "paymentTime")?;
        if payment_time < registration_time {
            return Err(ValidationError::NegativeDuration);
        }

        Ok(Self {
            user_id,
            username: req.username.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            payment_id,
            amount,
            currency,
            registration_time,
            payment_time,
            time_to_payment_ms: (payment_time - registration_time).num_milliseconds(),
            utm: req.utm.clone(),
            promo_id: req.promo_id.clone(),
        })
    }
}

/// Moment a user committed to a tariff, before any money moved. Logged to
/// the channel as-is, no time derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCreationLog {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub tariff_name: Option<String>,
    pub utm: Option<UtmParams>,
    pub promo_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PaymentCreationLog {
    pub fn validate(req: &PaymentCreationLogRequest) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id: req.user_id.ok_or(ValidationError::MissingField("userId"))?,
            username: req.username.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            payment_id: req
                .payment_id
                .clone()
                .ok_or(ValidationError::MissingField("paymentId"))?,
            amount: req.amount.ok_or(ValidationError::MissingField("amount"))?,
            currency: req
                .currency
                .clone()
                .ok_or(ValidationError::MissingField("currency"))?,
            tariff_name: req.tariff_name.clone(),
            utm: req.utm.clone(),
            promo_id: req.promo_id.clone(),
            timestamp: Utc::now(),
        })
    }
}

fn parse_instant(raw: &str, field: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp(field))
}

/// Renders a duration with the coarsest nonzero unit plus the next-finer
/// nonzero remainder. Never more than two units: 90 minutes is "1h 30m",
/// 45 seconds is "45s".
pub fn humanize_duration(ms: i64) -> String {
    const UNITS: [(i64, &str); 4] = [
        (86_400_000, "d"),
        (3_600_000, "h"),
        (60_000, "m"),
        (1_000, "s"),
    ];

    let ms = ms.max(0);
    for (i, (span, suffix)) in UNITS.iter().enumerate() {
        let count = ms / span;
        if count == 0 {
            continue;
        }
        let mut rendered = format!("{count}{suffix}");
        if let Some((next_span, next_suffix)) = UNITS.get(i + 1) {
            let remainder = (ms % span) / next_span;
            if remainder > 0 {
                rendered.push_str(&format!(" {remainder}{next_suffix}"));
            }
        }
        return rendered;
    }
    "0s".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> PaymentLogRequest {
        PaymentLogRequest {
            user_id: Some(42),
            payment_id: Some("pay_1".to_string()),
            amount: Some(100),
            currency: Some(STARS_CURRENCY.to_string()),
            registration_time: Some("2026-01-01T00:00:00Z".to_string()),
            payment_time: Some("2026-01-01T01:30:00Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn validate_and_derive_computes_time_to_payment() {
        let event = PaymentEvent::validate_and_derive(&full_request()).unwrap();
        assert_eq!(event.user_id, 42);
        assert_eq!(event.amount, 100);
        assert_eq!(event.time_to_payment_ms, 5_400_000);
    }

    #[test]
    fn validate_and_derive_reports_the_missing_field() {
        let mut req = full_request();
        req.payment_id = None;
        assert_eq!(
            PaymentEvent::validate_and_derive(&req),
            Err(ValidationError::MissingField("paymentId"))
        );

        let mut req = full_request();
        req.registration_time = None;
        assert_eq!(
            PaymentEvent::validate_and_derive(&req),
            Err(ValidationError::MissingField("registrationTime"))
        );
    }

    #[test]
    fn validate_and_derive_rejects_unparseable_timestamps() {
        let mut req = full_request();
        req.payment_time = Some("yesterday".to_string());
        assert_eq!(
            PaymentEvent::validate_and_derive(&req),
            Err(ValidationError::InvalidTimestamp("paymentTime"))
        );
    }

    #[test]
    fn validate_and_derive_rejects_inverted_timestamps() {
        let mut req = full_request();
        req.payment_time = Some("2025-12-31T23:59:59Z".to_string());
        assert_eq!(
            PaymentEvent::validate_and_derive(&req),
            Err(ValidationError::NegativeDuration)
        );
    }

    #[test]
    fn creation_log_requires_the_core_fields() {
        let req = PaymentCreationLogRequest {
            user_id: Some(42),
            payment_id: Some("pay_1".to_string()),
            amount: Some(500),
            currency: None,
            ..Default::default()
        };
        assert_eq!(
            PaymentCreationLog::validate(&req),
            Err(ValidationError::MissingField("currency"))
        );
    }

    #[test]
    fn humanize_duration_uses_at_most_two_units() {
        assert_eq!(humanize_duration(5_400_000), "1h 30m");
        assert_eq!(humanize_duration(45_000), "45s");
        assert_eq!(humanize_duration(90_061_000), "1d 1h");
        assert_eq!(humanize_duration(61_000), "1m 1s");
    }

    #[test]
    fn humanize_duration_drops_a_zero_remainder() {
        assert_eq!(humanize_duration(3_600_000), "1h");
        assert_eq!(humanize_duration(172_800_000), "2d");
    }

    #[test]
    fn humanize_duration_clamps_at_zero() {
        assert_eq!(humanize_duration(0), "0s");
        assert_eq!(humanize_duration(999), "0s");
        assert_eq!(humanize_duration(-5), "0s");
    }
}
