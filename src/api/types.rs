//! API Request/Response Types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::journal::{HistoryEntry, TokenSummary};
use crate::models::errors::AppError;

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        AppError::unauthorized().into()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self {
            code: e.code_str().to_string(),
            message: e.message,
            details: None,
        }
    }
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub mode: String,
    pub paused: bool,
}

// ============================================
// Profit / Trades
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfitData {
    pub realized_pnl_usd: f64,
    pub selectivity_threshold: u8,
    pub tokens: BTreeMap<String, TokenSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TradesData {
    pub total: usize,
    pub entries: Vec<HistoryEntry>,
}
