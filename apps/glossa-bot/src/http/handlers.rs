use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use crate::models::payment::{PaymentCreationLog, PaymentEvent};
use crate::services::pay_service::PayError;
use crate::AppState;
use glossa_shared::api::{InvoiceRequest, PaymentCreationLogRequest, PaymentLogRequest};

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Bot is running",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "paymentLoggingEnabled": state.config.payment_log_enabled,
    }))
}

pub async fn payment_log(
    State(state): State<AppState>,
    Json(req): Json<PaymentLogRequest>,
) -> Response {
    let event = match PaymentEvent::validate_and_derive(&req) {
        Ok(event) => event,
        Err(e) => return bad_request(&e.to_string()),
    };

    info!(
        "Payment log request processed (user {}, payment {}, time to payment {} ms)",
        event.user_id, event.payment_id, event.time_to_payment_ms
    );

    let logger = state.channel_log.clone();
    let ledger_entry = event.clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log_payment(&ledger_entry).await {
            error!(
                "Failed to log payment {} to channel: {:#}",
                ledger_entry.payment_id, e
            );
        }
    });

    Json(json!({
        "success": true,
        "message": "Payment logged successfully",
        "data": {
            "userId": event.user_id,
            "paymentId": event.payment_id,
            "timeToPayment": event.time_to_payment_ms,
        }
    }))
    .into_response()
}

pub async fn payment_creation_log(
    State(state): State<AppState>,
    Json(req): Json<PaymentCreationLogRequest>,
) -> Response {
    let entry = match PaymentCreationLog::validate(&req) {
        Ok(entry) => entry,
        Err(e) => return bad_request(&e.to_string()),
    };

    info!(
        "Payment creation log request processed (user {}, payment {})",
        entry.user_id, entry.payment_id
    );

    let logger = state.channel_log.clone();
    let channel_entry = entry.clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log_payment_creation(&channel_entry).await {
            error!(
                "Failed to log payment creation {} to channel: {:#}",
                channel_entry.payment_id, e
            );
        }
    });

    Json(json!({
        "success": true,
        "message": "Payment creation logged successfully",
        "data": {
            "userId": entry.user_id,
            "paymentId": entry.payment_id,
            "amount": entry.amount,
            "tariffName": entry.tariff_name,
        }
    }))
    .into_response()
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(req): Json<InvoiceRequest>,
) -> Response {
    match state.pay_service.create_invoice(&req).await {
        Ok(link) => Json(json!({
            "success": true,
            "data": { "invoiceLink": link },
        }))
        .into_response(),
        Err(PayError::Invalid(e)) => bad_request(&e.to_string()),
        Err(PayError::Gateway(e)) => {
            error!("Invoice creation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}
