use std::net::SocketAddr;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;

pub mod auth;
pub mod handlers;

#[cfg(test)]
mod tests;

pub fn router(state: AppState) -> Router {
    let log_routes = Router::new()
        .route("/payment-log", post(handlers::payment_log))
        .route("/payment-creation-log", post(handlers::payment_creation_log))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_payment_logging,
        ));

    let protected = Router::new()
        .route("/invoice", post(handlers::create_invoice))
        .merge(log_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = router(state);

    info!("HTTP API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
