use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::AppState;

/// Shared-secret bearer check. When no secret is configured the check is
/// skipped entirely, mirroring the backend's permissive dev mode.
pub async fn authenticate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(secret) = state.config.api_secret_key.as_deref() else {
        warn!("API_SECRET_KEY not configured, skipping authentication");
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Some(provided) = provided else {
        warn!("Missing authorization header");
        return unauthorized("Missing authorization header");
    };

    // Accept both "Bearer <key>" and the bare key.
    let token = provided.strip_prefix("Bearer ").unwrap_or(provided);
    if token != secret {
        warn!("Invalid API key");
        return unauthorized("Invalid API key");
    }

    debug!("API key authentication successful");
    next.run(req).await
}

/// Payment-log endpoints are gated behind a runtime flag.
pub async fn require_payment_logging(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if !state.config.payment_log_enabled {
        warn!(
            "Payment logging is disabled, rejecting {}",
            req.uri().path()
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "Payment logging is currently disabled",
            })),
        )
            .into_response();
    }
    next.run(req).await
}

fn unauthorized(error: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}
