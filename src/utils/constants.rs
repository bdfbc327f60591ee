//! Constants Module - Single Source of Truth
//!
//! Every default, endpoint and on-chain address used by the bot lives here.
//! Other modules read these through `BotConfig` so environment overrides win.

use alloy_primitives::U256;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Stripe Tiger";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("StripeTiger/", env!("CARGO_PKG_VERSION"));

// ============================================
// SERVER DEFAULTS
// ============================================

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port (container images expose this one)
pub const DEFAULT_PORT: u16 = 10000;

/// Path Telegram posts updates to
pub const WEBHOOK_PATH: &str = "/webhook";

/// Header carrying the webhook secret token
pub const WEBHOOK_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// In-flight request cap for the HTTP server
pub const MAX_CONCURRENT_REQUESTS: usize = 64;

// ============================================
// ENGINE DEFAULTS
// ============================================

pub const DEFAULT_POLL_SECONDS: u64 = 60;
/// Startup floor for the poll period
pub const MIN_POLL_SECONDS_STARTUP: u64 = 15;
/// Floor applied by `/poll`
pub const MIN_POLL_SECONDS_RUNTIME: u64 = 10;
pub const DEFAULT_ALLOCATION_USD: f64 = 50.0;
pub const MIN_ALLOCATION_USD: f64 = 1.0;
pub const DEFAULT_SLIPPAGE_BPS: u32 = 100;
pub const DEFAULT_BASE_GAS_LIMIT: u64 = 350_000;
pub const DEFAULT_MIN_LIQ_USD: f64 = 50_000.0;

pub const DEFAULT_SMA_FAST: usize = 20;
pub const DEFAULT_SMA_SLOW: usize = 50;
pub const DEFAULT_RSI_LEN: usize = 14;

pub const DEFAULT_AI_MIN_PROB_BUY: f64 = 0.55;
pub const DEFAULT_AI_MAX_PROB_SELL: f64 = 0.45;
pub const DEFAULT_RSI_BUY: f64 = 55.0;
pub const DEFAULT_RSI_SELL: f64 = 45.0;

pub const DEFAULT_TUNE_WARMUP: usize = 50;
pub const DEFAULT_TUNE_EVERY: u64 = 60;
pub const DEFAULT_AI_BUY_Q: f64 = 0.65;
pub const DEFAULT_AI_SELL_Q: f64 = 0.35;
pub const DEFAULT_RSI_BUY_Q: f64 = 0.60;
pub const DEFAULT_RSI_SELL_Q: f64 = 0.40;

/// Capacity of per-token price and score rings
pub const WINDOW_CAPACITY: usize = 2000;
/// Capacity of the recent-events ring
pub const EVENTS_CAPACITY: usize = 200;
/// Positions below this quantity count as flat
pub const POSITION_EPSILON: f64 = 1e-12;

/// Swap deadline offset
pub const SWAP_DEADLINE_SECS: u64 = 600;

// ============================================
// STORAGE DEFAULTS
// ============================================

pub const DEFAULT_STATE_PATH: &str = "/tmp/stripe_tiger_state.json";
pub const DEFAULT_JOURNAL_PATH: &str = "memory/ai_brain.json";
pub const DEFAULT_HISTORY_PATH: &str = "memory/trade_history.json";

// ============================================
// MARKET DATA ENDPOINTS
// ============================================

pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";
pub const DEXSCREENER_TIMEOUT_SECS: u64 = 12;

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const COINGECKO_TIMEOUT_SECS: u64 = 10;

/// Retry policy for market data (transient failures only)
pub const MARKET_MAX_RETRIES: u32 = 3;
pub const MARKET_BASE_RETRY_MS: u64 = 250;
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// ROUTER / WRAPPED NATIVE ADDRESSES
// ============================================

/// Uniswap V2 Router (Ethereum)
pub const UNISWAP_V2_ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
/// PancakeSwap V2 Router (BSC)
pub const PANCAKE_V2_ROUTER: &str = "0x10ED43C718714eb63d5aA57B78B54704E256024E";
/// WETH (Ethereum)
pub const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
/// WBNB (BSC)
pub const WBNB_ADDRESS: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";

// ============================================
// SCREENING
// ============================================

/// Token names containing any of these are rejected outright
pub const SCAM_NAME_MARKERS: [&str; 8] = ["rug", "elon", "shit", "moon", "baby", "inu", "fuck", "scam"];
pub const MIN_SCREEN_LIQUIDITY_USD: f64 = 1.0;
pub const MIN_SCREEN_AGE_DAYS: f64 = 3.0;

// ============================================
// CONVERSION UTILITIES
// ============================================

/// Convert a native-coin amount (ETH/BNB) to wei
#[inline]
pub fn eth_to_wei(eth: f64) -> U256 {
    if !eth.is_finite() || eth <= 0.0 {
        return U256::ZERO;
    }
    U256::from((eth * 1e18) as u128)
}

/// Convert wei to a native-coin amount
#[inline]
pub fn wei_to_eth(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}

/// Apply slippage tolerance to a quoted output amount
#[inline]
pub fn apply_slippage(quoted: U256, slippage_bps: u32) -> U256 {
    let bps = U256::from(slippage_bps.min(10_000));
    quoted * (U256::from(10_000u64) - bps) / U256::from(10_000u64)
}
