//! API Request Handlers

use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::types::*;
use crate::core::engine::{EngineSnapshot, TradeMachine};
use crate::core::journal::DEFAULT_SELECTIVITY;
use crate::models::errors::AppError;
use crate::telegram::commands::{CommandHandler, Update};
use crate::utils::constants::{APP_NAME, APP_VERSION};

const DEFAULT_TRADES_LIMIT: usize = 50;

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared application state
pub struct AppState {
    pub engine: Arc<TradeMachine>,
    pub commands: Arc<CommandHandler>,
    pub webhook_secret: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        engine: Arc<TradeMachine>,
        commands: Arc<CommandHandler>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            engine,
            commands,
            webhook_secret,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_response(e: AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(e.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warn!(code = e.code_str(), status = status.as_u16(), "API error: {}", e.message);
    (status, Json(ApiResponse::error(e.into(), elapsed_ms(start))))
}

// ============================================
// Liveness
// ============================================

pub async fn root() -> String {
    format!("{} v{} is running", APP_NAME, APP_VERSION)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        mode: state.engine.mode().to_string(),
        paused: state.engine.is_paused(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Engine
// ============================================

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<EngineSnapshot>> {
    let start = Instant::now();
    let snapshot = state.engine.snapshot();
    Json(ApiResponse::success(snapshot, elapsed_ms(start)))
}

pub async fn get_profit(State(state): State<Arc<AppState>>) -> ApiResult<ProfitData> {
    let start = Instant::now();

    let (tokens, selectivity_threshold) = match state.engine.journal() {
        Some(journal) => {
            let book = journal.load().map_err(|e| error_response(e, start))?;
            (
                crate::core::journal::summarize(&book),
                crate::core::journal::selectivity(&book),
            )
        }
        None => (Default::default(), DEFAULT_SELECTIVITY),
    };

    let data = ProfitData {
        realized_pnl_usd: state.engine.pnl_usd(),
        selectivity_threshold,
        tokens,
    };
    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> ApiResult<TradesData> {
    let start = Instant::now();
    let limit = query.limit.unwrap_or(DEFAULT_TRADES_LIMIT);

    let all = match state.engine.history() {
        Some(history) => history.entries().map_err(|e| error_response(e, start))?,
        None => Vec::new(),
    };
    let total = all.len();
    let entries = all.into_iter().skip(total.saturating_sub(limit)).collect();

    Ok(Json(ApiResponse::success(
        TradesData { total, entries },
        elapsed_ms(start),
    )))
}

// ============================================
// Telegram webhook
// ============================================

/// Always acknowledges; Telegram retries anything but 2xx
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<ApiResponse<&'static str>> {
    let start = Instant::now();

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            debug!(update_id = update.update_id, "📥 Webhook update");
            state.commands.handle_update(&update).await;
        }
        Err(e) => {
            let err = AppError::bad_request(format!("malformed update: {}", e));
            warn!(code = err.code_str(), bytes = body.len(), "⚠️ {}", err.message);
        }
    }

    Json(ApiResponse::success("ok", elapsed_ms(start)))
}
