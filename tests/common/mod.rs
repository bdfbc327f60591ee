//! Test doubles for the engine seams: market data, chat notifier, swap executor.
//!
//! Nothing here touches the network.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stripe_tiger::models::{AppResult, Chain, EngineSettings, PairQuote, StorageSettings};
use stripe_tiger::{MarketData, Notifier, SwapExecutor, TradeMachine};

pub const ETH_TOKEN: &str = "0x1111111111111111111111111111111111111111";
pub const BSC_TOKEN: &str = "0x2222222222222222222222222222222222222222";
pub const ADMIN: i64 = 4242;
pub const STRANGER: i64 = 7;

/// Market whose quotes the test sets directly
#[derive(Default)]
pub struct MockMarket {
    quotes: Mutex<HashMap<String, PairQuote>>,
    base_price: Mutex<Option<f64>>,
}

impl MockMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            quotes: Mutex::new(HashMap::new()),
            base_price: Mutex::new(Some(2000.0)),
        })
    }

    pub fn set_price(&self, token: &str, price: f64) {
        self.set_quote(token, Some(price), Some(1_000_000.0));
    }

    pub fn set_quote(&self, token: &str, price: Option<f64>, liquidity: Option<f64>) {
        let quote = PairQuote {
            price_usd: price,
            liquidity_usd: liquidity,
            chain_id: "ethereum".to_string(),
            name: "Tiger Token".to_string(),
            symbol: "TGR".to_string(),
            ..Default::default()
        };
        self.quotes
            .lock()
            .unwrap()
            .insert(token.to_string(), quote);
    }

    pub fn set_base_price(&self, price: Option<f64>) {
        *self.base_price.lock().unwrap() = price;
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn best_pair(&self, token: &str) -> Option<PairQuote> {
        self.quotes.lock().unwrap().get(token).cloned()
    }

    async fn base_price_usd(&self, _chain: Chain) -> Option<f64> {
        *self.base_price.lock().unwrap()
    }
}

/// Records every message instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, t)| t).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapCall {
    Buy {
        chain: Chain,
        token: String,
        base_amount: f64,
        slippage_bps: u32,
    },
    Sell {
        chain: Chain,
        token: String,
        slippage_bps: u32,
    },
}

/// Executor that records calls and returns a fixed hash, or fails
pub struct MockExecutor {
    calls: Mutex<Vec<SwapCall>>,
    fail: bool,
}

impl MockExecutor {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn calls(&self) -> Vec<SwapCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapExecutor for MockExecutor {
    async fn buy(
        &self,
        chain: Chain,
        token: &str,
        base_amount: f64,
        slippage_bps: u32,
    ) -> eyre::Result<String> {
        self.calls.lock().unwrap().push(SwapCall::Buy {
            chain,
            token: token.to_string(),
            base_amount,
            slippage_bps,
        });
        if self.fail {
            return Err(eyre::eyre!("execution reverted"));
        }
        Ok("0xfeed".to_string())
    }

    async fn sell(&self, chain: Chain, token: &str, slippage_bps: u32) -> eyre::Result<String> {
        self.calls.lock().unwrap().push(SwapCall::Sell {
            chain,
            token: token.to_string(),
            slippage_bps,
        });
        if self.fail {
            return Err(eyre::eyre!("execution reverted"));
        }
        Ok("0xbeef".to_string())
    }
}

/// Settings with both tokens configured and alerts going to the admin chat
pub fn settings() -> EngineSettings {
    EngineSettings {
        eth_token: ETH_TOKEN.to_string(),
        bsc_token: BSC_TOKEN.to_string(),
        alert_chat_id: Some(ADMIN),
        ..Default::default()
    }
}

pub fn storage(dir: &std::path::Path) -> StorageSettings {
    StorageSettings {
        state_path: dir.join("state.json"),
        journal_path: dir.join("journal.json"),
        history_path: dir.join("history.json"),
    }
}

pub struct Harness {
    pub engine: Arc<TradeMachine>,
    pub market: Arc<MockMarket>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(settings: EngineSettings) -> Harness {
    let market = MockMarket::new();
    let notifier = RecordingNotifier::new();
    let engine = Arc::new(TradeMachine::new(settings, market.clone(), notifier.clone()));
    Harness {
        engine,
        market,
        notifier,
    }
}

pub fn harness_with(
    settings: EngineSettings,
    build: impl FnOnce(TradeMachine) -> TradeMachine,
) -> Harness {
    let market = MockMarket::new();
    let notifier = RecordingNotifier::new();
    let engine = Arc::new(build(TradeMachine::new(
        settings,
        market.clone(),
        notifier.clone(),
    )));
    Harness {
        engine,
        market,
        notifier,
    }
}
