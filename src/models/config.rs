//! Configuration module for Stripe Tiger
//!
//! Everything is read from the environment (after `.env` is loaded by the
//! binary). Defaults come from `utils/constants.rs`; nothing is hardcoded here.
//! Secrets (bot token, private keys) are never logged.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, TradeMode};
use crate::utils::constants::*;

/// Telegram wiring
#[derive(Debug, Clone, Default)]
pub struct TelegramSettings {
    pub token: Option<String>,
    pub admin_chat_id: Option<i64>,
    /// Chat receiving engine alerts
    pub alert_chat_id: Option<i64>,
    /// Public base URL; `<base>/webhook` is registered at startup
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tunables owned by the trade engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub mode: TradeMode,
    /// Only `DEX` enables live execution
    pub execution_mode: String,
    pub eth_token: String,
    pub bsc_token: String,
    pub poll_seconds: u64,
    pub allocation_usd: f64,
    pub slippage_bps: u32,
    pub min_liq_usd: f64,

    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_len: usize,

    pub ai_min_prob_buy: f64,
    pub ai_max_prob_sell: f64,
    pub rsi_buy: f64,
    pub rsi_sell: f64,

    pub auto_tune: bool,
    pub lock_tuned: bool,
    pub tune_warmup: usize,
    pub tune_every: u64,
    pub ai_buy_q: f64,
    pub ai_sell_q: f64,
    pub rsi_buy_q: f64,
    pub rsi_sell_q: f64,

    pub alert_chat_id: Option<i64>,
    /// Presence of live credentials, for the readiness report
    pub has_rpc_url: bool,
    pub has_private_key: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: TradeMode::Mock,
            execution_mode: "DEX".to_string(),
            eth_token: String::new(),
            bsc_token: String::new(),
            poll_seconds: DEFAULT_POLL_SECONDS,
            allocation_usd: DEFAULT_ALLOCATION_USD,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            min_liq_usd: DEFAULT_MIN_LIQ_USD,
            sma_fast: DEFAULT_SMA_FAST,
            sma_slow: DEFAULT_SMA_SLOW,
            rsi_len: DEFAULT_RSI_LEN,
            ai_min_prob_buy: DEFAULT_AI_MIN_PROB_BUY,
            ai_max_prob_sell: DEFAULT_AI_MAX_PROB_SELL,
            rsi_buy: DEFAULT_RSI_BUY,
            rsi_sell: DEFAULT_RSI_SELL,
            auto_tune: true,
            lock_tuned: false,
            tune_warmup: DEFAULT_TUNE_WARMUP,
            tune_every: DEFAULT_TUNE_EVERY,
            ai_buy_q: DEFAULT_AI_BUY_Q,
            ai_sell_q: DEFAULT_AI_SELL_Q,
            rsi_buy_q: DEFAULT_RSI_BUY_Q,
            rsi_sell_q: DEFAULT_RSI_SELL_Q,
            alert_chat_id: None,
            has_rpc_url: false,
            has_private_key: false,
        }
    }
}

/// Per-chain signing and routing for live swaps
#[derive(Clone)]
pub struct ChainWallet {
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub router: String,
    pub wrapped_native: String,
}

impl ChainWallet {
    pub fn is_complete(&self) -> bool {
        self.rpc_url.is_some() && self.private_key.is_some()
    }
}

// Keys must never reach logs, even through `{:?}`
impl std::fmt::Debug for ChainWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainWallet")
            .field("rpc_url", &self.rpc_url.as_ref().map(|_| "<set>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<hidden>"))
            .field("router", &self.router)
            .field("wrapped_native", &self.wrapped_native)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub eth: ChainWallet,
    pub bsc: ChainWallet,
    pub gas_limit: u64,
}

impl LiveSettings {
    pub fn wallet(&self, chain: Chain) -> &ChainWallet {
        match chain {
            Chain::Eth => &self.eth,
            Chain::Bsc => &self.bsc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub state_path: PathBuf,
    pub journal_path: PathBuf,
    pub history_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramSettings,
    pub server: ServerSettings,
    pub log_level: String,
    pub engine: EngineSettings,
    pub live: LiveSettings,
    pub storage: StorageSettings,
}

impl BotConfig {
    /// Load from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (tests inject a map)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let admin_chat_id = env.parse_opt::<i64>("ADMIN_CHAT_ID")?;
        let alert_chat_id = match env.first(&["ALERT_CHAT_ID", "TELEGRAM_CHAT_ID"]) {
            Some((key, raw)) => Some(parse_value::<i64>(key, &raw)?),
            None => admin_chat_id,
        };

        let telegram = TelegramSettings {
            token: env.first(&["TELEGRAM_TOKEN", "TELEGRAM_BOT_TOKEN"]).map(|(_, v)| v),
            admin_chat_id,
            alert_chat_id,
            webhook_url: env
                .first(&["WEBHOOK_URL", "RENDER_EXTERNAL_URL"])
                .map(|(_, v)| v.trim_end_matches('/').to_string()),
            webhook_secret: env.string("WEBHOOK_SECRET"),
        };

        let server = ServerSettings {
            host: env.string("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.parse_or("PORT", DEFAULT_PORT)?,
        };

        let live = LiveSettings {
            eth: ChainWallet {
                rpc_url: env.string("RPC_URL_ETH"),
                private_key: env.string("WALLET_PRIVATE_KEY_ETH"),
                router: env
                    .string("UNISWAP_ROUTER")
                    .unwrap_or_else(|| UNISWAP_V2_ROUTER.to_string()),
                wrapped_native: env
                    .string("WETH_ADDRESS")
                    .unwrap_or_else(|| WETH_ADDRESS.to_string()),
            },
            bsc: ChainWallet {
                rpc_url: env.string("RPC_URL_BSC"),
                private_key: env.string("WALLET_PRIVATE_KEY_BSC"),
                router: env
                    .string("PANCAKE_ROUTER")
                    .unwrap_or_else(|| PANCAKE_V2_ROUTER.to_string()),
                wrapped_native: env
                    .string("WBNB_ADDRESS")
                    .unwrap_or_else(|| WBNB_ADDRESS.to_string()),
            },
            gas_limit: env.parse_or("BASE_EOA_GAS_LIMIT", DEFAULT_BASE_GAS_LIMIT)?,
        };

        let poll: u64 = env.parse_or("POLL_SECONDS", DEFAULT_POLL_SECONDS)?;

        let engine = EngineSettings {
            mode: TradeMode::parse(&env.string("TRADE_MODE").unwrap_or_default()),
            execution_mode: env
                .string("EXECUTION_MODE")
                .unwrap_or_else(|| "DEX".to_string())
                .to_ascii_uppercase(),
            eth_token: env.string("ETH_TOKEN_ADDRESS").unwrap_or_default(),
            bsc_token: env.string("BSC_TOKEN_ADDRESS").unwrap_or_default(),
            poll_seconds: poll.max(MIN_POLL_SECONDS_STARTUP),
            allocation_usd: env.parse_or("ALLOCATION_USD", DEFAULT_ALLOCATION_USD)?,
            slippage_bps: env.parse_or("SLIPPAGE_BPS", DEFAULT_SLIPPAGE_BPS)?,
            min_liq_usd: env.parse_or("MIN_LIQ_USD", DEFAULT_MIN_LIQ_USD)?,
            sma_fast: env.parse_or("SMA_FAST", DEFAULT_SMA_FAST)?,
            sma_slow: env.parse_or("SMA_SLOW", DEFAULT_SMA_SLOW)?,
            rsi_len: env.parse_or("RSI_LEN", DEFAULT_RSI_LEN)?,
            ai_min_prob_buy: env.parse_or("AI_MIN_PROB_BUY", DEFAULT_AI_MIN_PROB_BUY)?,
            ai_max_prob_sell: env.parse_or("AI_MAX_PROB_SELL", DEFAULT_AI_MAX_PROB_SELL)?,
            rsi_buy: env.parse_or("RSI_BUY", DEFAULT_RSI_BUY)?,
            rsi_sell: env.parse_or("RSI_SELL", DEFAULT_RSI_SELL)?,
            auto_tune: env.flag("AUTO_TUNE", true)?,
            lock_tuned: env.flag("LOCK_TUNED", false)?,
            tune_warmup: env.parse_or("TUNE_WARMUP", DEFAULT_TUNE_WARMUP)?,
            tune_every: env.parse_or::<u64>("TUNE_EVERY", DEFAULT_TUNE_EVERY)?.max(1),
            ai_buy_q: env.parse_or("AI_BUY_Q", DEFAULT_AI_BUY_Q)?,
            ai_sell_q: env.parse_or("AI_SELL_Q", DEFAULT_AI_SELL_Q)?,
            rsi_buy_q: env.parse_or("RSI_BUY_Q", DEFAULT_RSI_BUY_Q)?,
            rsi_sell_q: env.parse_or("RSI_SELL_Q", DEFAULT_RSI_SELL_Q)?,
            alert_chat_id,
            has_rpc_url: live.eth.rpc_url.is_some() || live.bsc.rpc_url.is_some(),
            has_private_key: live.eth.private_key.is_some() || live.bsc.private_key.is_some(),
        };

        let storage = StorageSettings {
            state_path: env
                .string("STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            journal_path: env
                .string("JOURNAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_PATH)),
            history_path: env
                .string("HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
        };

        Ok(Self {
            telegram,
            server,
            log_level: env.string("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            engine,
            live,
            storage,
        })
    }

    /// Full webhook URL, when a public base URL is configured
    pub fn webhook_endpoint(&self) -> Option<String> {
        self.telegram
            .webhook_url
            .as_ref()
            .map(|base| format!("{}{}", base, WEBHOOK_PATH))
    }

    /// Log a summary without secrets
    pub fn log_summary(&self) {
        info!(
            mode = %self.engine.mode,
            poll = self.engine.poll_seconds,
            alloc = self.engine.allocation_usd,
            "⚙️ Engine settings"
        );
        info!(
            telegram = self.telegram.token.is_some(),
            admin = self.telegram.admin_chat_id.is_some(),
            webhook = self.telegram.webhook_url.is_some(),
            "📨 Telegram settings (token hidden)"
        );
        info!(
            eth_ready = self.live.eth.is_complete(),
            bsc_ready = self.live.bsc.is_complete(),
            "🔑 Live wallets (keys hidden)"
        );
    }
}

// ============================================
// Lookup helpers
// ============================================

struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Trimmed, non-empty value
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// First key that is set, with the key it came from
    fn first<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, String)> {
        keys.iter().find_map(|k| self.string(k).map(|v| (*k, v)))
    }

    fn parse_opt<T: FromStr>(&self, key: &str) -> AppResult<Option<T>> {
        self.string(key)
            .map(|raw| parse_value(key, &raw))
            .transpose()
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> AppResult<T> {
        Ok(self.parse_opt(key)?.unwrap_or(default))
    }

    fn flag(&self, key: &str, default: bool) -> AppResult<bool> {
        match self.string(key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(AppError::invalid_value(key, &raw)),
            },
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.parse::<T>()
        .map_err(|_| AppError::invalid_value(key, raw))
}
