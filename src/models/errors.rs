//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs on the hosting
//! platform can be filtered by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CFG_xxx: Configuration errors
//! - MARKET_xxx: Price / liquidity data errors
//! - EXEC_xxx: Trade execution errors
//! - TG_xxx: Telegram errors
//! - STORE_xxx: Persistence errors
//! - API_xxx: HTTP API errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Market Data Errors
    // ============================================
    /// Dexscreener API error
    DexScreenerError,
    /// CoinGecko API error
    CoinGeckoError,
    /// External service timeout
    ExternalTimeout,

    // ============================================
    // Execution Errors
    // ============================================
    /// Missing RPC provider or private key for chain
    ExecMissingWallet,
    /// Swap transaction failed
    ExecSwapFailed,
    /// Nothing to sell
    ExecNoBalance,
    /// Invalid token address
    ExecInvalidAddress,

    // ============================================
    // Telegram Errors
    // ============================================
    /// Bot API call failed
    TelegramSendFailed,
    /// Webhook registration failed
    TelegramWebhookFailed,

    // ============================================
    // Storage Errors
    // ============================================
    /// Reading a persisted file failed
    StoreReadFailed,
    /// Writing a persisted file failed
    StoreWriteFailed,
    /// Persisted file is corrupt
    StoreCorrupt,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Unauthorized (bad webhook secret)
    ApiUnauthorized,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Configuration Errors
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Market Data Errors
            Self::DexScreenerError => "MARKET_DEXSCREENER_ERROR",
            Self::CoinGeckoError => "MARKET_COINGECKO_ERROR",
            Self::ExternalTimeout => "MARKET_TIMEOUT",

            // Execution Errors
            Self::ExecMissingWallet => "EXEC_MISSING_WALLET",
            Self::ExecSwapFailed => "EXEC_SWAP_FAILED",
            Self::ExecNoBalance => "EXEC_NO_BALANCE",
            Self::ExecInvalidAddress => "EXEC_INVALID_ADDRESS",

            // Telegram Errors
            Self::TelegramSendFailed => "TG_SEND_FAILED",
            Self::TelegramWebhookFailed => "TG_WEBHOOK_FAILED",

            // Storage Errors
            Self::StoreReadFailed => "STORE_READ_FAILED",
            Self::StoreWriteFailed => "STORE_WRITE_FAILED",
            Self::StoreCorrupt => "STORE_CORRUPT",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ExecInvalidAddress | Self::ConfigInvalidValue => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiNotFound | Self::StoreReadFailed => 404,
            Self::ExternalTimeout => 504,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout
                | Self::DexScreenerError
                | Self::CoinGeckoError
                | Self::TelegramSendFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Environment variable present but unparsable
    pub fn invalid_value(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }

    /// Dexscreener error
    pub fn dexscreener_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DexScreenerError, msg)
    }

    /// CoinGecko error
    pub fn coingecko_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CoinGeckoError, msg)
    }

    /// Missing provider or key for a chain
    pub fn missing_wallet(chain: &str) -> Self {
        Self::new(
            ErrorCode::ExecMissingWallet,
            format!("missing provider/private key for {}", chain),
        )
    }

    /// Swap failed
    pub fn swap_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecSwapFailed, msg)
    }

    /// Nothing to sell
    pub fn no_balance() -> Self {
        Self::new(ErrorCode::ExecNoBalance, "no token balance to sell")
    }

    /// Invalid token address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecInvalidAddress, msg)
    }

    /// Telegram send failure
    pub fn telegram(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TelegramSendFailed, msg)
    }

    /// Storage write failure
    pub fn store_write(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::StoreWriteFailed,
            format!("Failed to write {}", path.display()),
            source,
        )
    }

    /// Storage read failure
    pub fn store_read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::StoreReadFailed,
            format!("Failed to read {}", path.display()),
            source,
        )
    }

    /// Corrupt persisted file
    pub fn store_corrupt(path: &std::path::Path, source: serde_json::Error) -> Self {
        Self::with_source(
            ErrorCode::StoreCorrupt,
            format!("Corrupt data in {}", path.display()),
            source,
        )
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API unauthorized
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::ApiUnauthorized, "Invalid or missing webhook secret")
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ApiBadRequest, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::missing_wallet("BSC");
        assert_eq!(err.code, ErrorCode::ExecMissingWallet);
        assert_eq!(err.code_str(), "EXEC_MISSING_WALLET");
        assert_eq!(err.to_string(), "[EXEC_MISSING_WALLET] missing provider/private key for BSC");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ExternalTimeout.is_retryable());
        assert!(ErrorCode::DexScreenerError.is_retryable());
        assert!(!ErrorCode::ExecNoBalance.is_retryable());
        assert!(!ErrorCode::ConfigInvalidValue.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiUnauthorized.http_status(), 401);
        assert_eq!(ErrorCode::ExecSwapFailed.http_status(), 500);
    }

    #[test]
    fn test_invalid_value_message() {
        let err = AppError::invalid_value("POLL_SECONDS", "abc");
        assert!(err.message.contains("POLL_SECONDS"));
        assert!(err.message.contains("abc"));
    }
}
