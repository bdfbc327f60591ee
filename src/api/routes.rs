//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, webhook_secret_middleware};
use crate::utils::constants::{MAX_CONCURRENT_REQUESTS, WEBHOOK_PATH};

/// Create the router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        .route("/profit", get(handlers::get_profit))
        .route("/trades", get(handlers::get_trades))
        .route(WEBHOOK_PATH, post(handlers::telegram_webhook))
        // bottom layer runs first
        .layer(middleware::from_fn_with_state(
            state.clone(),
            webhook_secret_middleware,
        ))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
}
