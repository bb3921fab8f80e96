use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use teloxide::Bot;
use tower::ServiceExt;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::http::router;
use crate::services::first_touch::FirstTouchTracker;
use crate::services::logging_service::LoggingService;
use crate::services::pay_service::{PayService, TelegramGateway};
use crate::AppState;

fn test_state(secret: Option<&str>, payment_log_enabled: bool) -> AppState {
    let config = Config {
        bot_token: "123456:TEST".to_string(),
        bot_username: "glossa_test_bot".to_string(),
        api_base_url: "http://127.0.0.1:9".to_string(),
        mini_app_url: "https://app.glossa.test".parse().unwrap(),
        mini_app_startapp_enabled: true,
        port: 0,
        log_channel_id: None,
        log_channel_enabled: false,
        api_secret_key: secret.map(String::from),
        payment_log_enabled,
        admin_chat_id: None,
    };
    let bot = Bot::new(config.bot_token.clone());
    AppState {
        api: ApiClient::new(config.api_base_url.clone()),
        first_touch: FirstTouchTracker::new(),
        pay_service: PayService::new(Arc::new(TelegramGateway::new(config.bot_token.clone()))),
        channel_log: LoggingService::new(bot, None, false),
        config,
    }
}

fn post(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(state: AppState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router(state).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn payment_log_body() -> serde_json::Value {
    serde_json::json!({
        "userId": 42,
        "paymentId": "pay_1",
        "amount": 100,
        "currency": "XTR",
        "registrationTime": "2026-01-01T00:00:00Z",
        "paymentTime": "2026-01-01T01:30:00Z",
    })
}

#[tokio::test]
async fn health_is_open_and_reports_the_payment_logging_flag() {
    let req = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_state(Some("s3cret"), true), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["paymentLoggingEnabled"], true);
}

#[tokio::test]
async fn payment_log_requires_the_shared_secret() {
    let (status, body) = send(
        test_state(Some("s3cret"), true),
        post("/api/payment-log", None, payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        test_state(Some("s3cret"), true),
        post("/api/payment-log", Some("Bearer wrong"), payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn payment_log_accepts_bearer_and_bare_tokens() {
    let (status, _) = send(
        test_state(Some("s3cret"), true),
        post("/api/payment-log", Some("Bearer s3cret"), payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        test_state(Some("s3cret"), true),
        post("/api/payment-log", Some("s3cret"), payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn authentication_is_skipped_when_no_secret_is_configured() {
    let (status, _) = send(
        test_state(None, true),
        post("/api/payment-log", None, payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn payment_log_derives_the_time_to_payment() {
    let (status, body) = send(
        test_state(None, true),
        post("/api/payment-log", None, payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["timeToPayment"], 5_400_000);
    assert_eq!(body["data"]["paymentId"], "pay_1");
}

#[tokio::test]
async fn payment_log_names_the_missing_field() {
    let mut body = payment_log_body();
    body.as_object_mut().unwrap().remove("paymentId");
    let (status, body) = send(test_state(None, true), post("/api/payment-log", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("paymentId"));
}

#[tokio::test]
async fn payment_log_rejects_inverted_timestamps() {
    let mut body = payment_log_body();
    body["paymentTime"] = serde_json::json!("2025-12-31T23:59:59Z");
    let (status, body) = send(test_state(None, true), post("/api/payment-log", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("before registration"));
}

#[tokio::test]
async fn payment_endpoints_return_503_when_logging_is_disabled() {
    let (status, body) = send(
        test_state(None, false),
        post("/api/payment-log", None, payment_log_body()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn payment_creation_log_echoes_the_accepted_entry() {
    let body = serde_json::json!({
        "userId": 42,
        "paymentId": "pay_9",
        "amount": 500,
        "currency": "XTR",
        "tariffName": "Phrase pack",
    });
    let (status, body) = send(
        test_state(None, true),
        post("/api/payment-creation-log", None, body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["paymentId"], "pay_9");
    assert_eq!(body["data"]["tariffName"], "Phrase pack");
}

#[tokio::test]
async fn invoice_endpoint_fails_fast_on_invalid_requests() {
    let body = serde_json::json!({
        "userId": 42,
        "productName": "Phrase pack",
        "description": "20 phrases in 7 days",
        "amount": 0,
    });
    let (status, body) = send(test_state(None, true), post("/api/invoice", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("positive"));

    let body = serde_json::json!({
        "userId": 42,
        "productName": "Phrase pack",
        "description": "20 phrases in 7 days",
        "amount": 100,
        "currency": "USD",
    });
    let (status, _) = send(test_state(None, true), post("/api/invoice", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoice_endpoint_is_not_gated_by_the_payment_logging_flag() {
    // Logging disabled must still allow invoice creation; this request is
    // invalid on purpose so it stops at validation, not at the gateway.
    let body = serde_json::json!({ "userId": 42, "amount": 10 });
    let (status, body) = send(test_state(None, false), post("/api/invoice", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("productName"));
}
