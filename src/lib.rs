//! Stripe Tiger
//!
//! Telegram-controlled DEX trading bot:
//! - Trade machine polling Dexscreener for one ETH and one BSC token
//! - SMA/RSI signals gated by an adaptive score, with auto-tuned thresholds
//! - Paper fills in mock mode, Uniswap/PancakeSwap V2 swaps in live mode
//! - Telegram webhook + status API served by axum

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod telegram;
pub mod utils;

pub use crate::core::{scheduler, EngineSnapshot, PositionView, TradeMachine};
pub use models::{AppError, AppResult, BotConfig, Chain, ErrorCode, Side, TradeMode};
pub use providers::{DexExecutor, MarketClient, MarketData, SwapExecutor};
pub use telegram::{CommandHandler, LogNotifier, Notifier, TelegramNotifier};
