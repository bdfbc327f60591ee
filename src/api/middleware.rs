//! API Middleware (Webhook secret, Logging)

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::handlers::AppState;
use super::types::{ApiError, ApiResponse};
use crate::utils::constants::{WEBHOOK_PATH, WEBHOOK_SECRET_HEADER};

/// Reject webhook posts whose secret header does not match `WEBHOOK_SECRET`
pub async fn webhook_secret_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    // only the webhook is guarded
    if request.uri().path() != WEBHOOK_PATH {
        return next.run(request).await;
    }
    let Some(expected) = state.webhook_secret.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        next.run(request).await
    } else {
        warn!(present = provided.is_some(), "⛔ Webhook secret mismatch");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error(ApiError::unauthorized(), 0.0)),
        )
            .into_response()
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}
