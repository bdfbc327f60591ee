//! Trade Engine - "The Trade Machine"
//!
//! One instance drives everything the bot trades:
//! 1. `run_cycle`: pull the best-pair quote for each configured token, feed the
//!    price window and adaptive score, maybe auto-tune, act on buy/sell signals
//! 2. `execute`: paper fills in mock mode, router swaps in live mode
//! 3. Admin knobs and chat-facing reports
//!
//! State sits behind a `std::sync::Mutex` that is never held across `.await`:
//! quotes and swaps happen outside the lock, results are applied inside it.
//! Fills are serialized by a separate async gate, so the "flat?" decision,
//! the swap and the journal writes of one trade never interleave with another.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::core::brain::AdaptiveBrain;
use crate::core::indicators::PriceWindow;
use crate::core::journal::{write_json, HistoryEntry, Outcome, TradeHistory, TradeJournal};
use crate::core::screening;
use crate::core::tuning::{self, Thresholds};
use crate::models::config::{EngineSettings, StorageSettings};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, PairQuote, Position, Side, TradeMode};
use crate::providers::dex_executor::SwapExecutor;
use crate::providers::market::MarketData;
use crate::telegram::notifier::{send_logged, Notifier};
use crate::utils::constants::{
    EVENTS_CAPACITY, MIN_ALLOCATION_USD, MIN_POLL_SECONDS_RUNTIME, POSITION_EPSILON,
    WINDOW_CAPACITY,
};
use crate::utils::format::{fmt_opt, mask, now_iso, or_none, round_to, with_commas};

const INDICATOR_LOG_EVERY: u64 = 20;
const NO_TOKEN_HINT_EVERY: u64 = 10;
const DEFAULT_EVENTS_SHOWN: usize = 12;

// ============================================
// Public views
// ============================================

/// Open position with its current market value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub chain: Chain,
    pub token: String,
    pub qty: f64,
    pub avg_price: f64,
    pub market_value: f64,
    pub opened_at: Option<String>,
}

/// Engine state exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub mode: TradeMode,
    pub paused: bool,
    pub cycle: u64,
    pub poll_seconds: u64,
    pub allocation_usd: f64,
    pub slippage_bps: u32,
    pub min_liq_usd: f64,
    pub eth_token: String,
    pub bsc_token: String,
    pub positions: usize,
    pub pnl_usd: f64,
    pub live_ready: bool,
    pub thresholds: BTreeMap<String, Thresholds>,
    pub recent_events: Vec<String>,
}

/// Paper portfolio persisted across restarts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioState {
    pub positions: BTreeMap<String, Position>,
    pub pnl_usd: f64,
    pub saved_at: String,
}

// ============================================
// Internal state
// ============================================

struct EngineState {
    settings: EngineSettings,
    paused: bool,
    windows: HashMap<String, PriceWindow>,
    brains: HashMap<String, AdaptiveBrain>,
    tuned: HashMap<String, Thresholds>,
    positions: BTreeMap<String, Position>,
    pnl_usd: f64,
    cycle: u64,
    events: VecDeque<String>,
}

impl EngineState {
    fn log_event(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        let stamp = chrono::Local::now().format("%H:%M:%S");
        if self.events.len() == EVENTS_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(format!("{} | {}", stamp, text));
    }

    fn tasks(&self) -> Vec<(Chain, String)> {
        let mut out = Vec::new();
        if !self.settings.eth_token.is_empty() {
            out.push((Chain::Eth, self.settings.eth_token.clone()));
        }
        if !self.settings.bsc_token.is_empty() {
            out.push((Chain::Bsc, self.settings.bsc_token.clone()));
        }
        out
    }

    fn holds(&self, token: &str) -> bool {
        self.positions
            .get(token)
            .map(|p| p.qty > POSITION_EPSILON)
            .unwrap_or(false)
    }

    fn thresholds(&self, token: &str) -> Thresholds {
        self.tuned
            .get(token)
            .copied()
            .unwrap_or_else(|| Thresholds::baseline(&self.settings))
    }

    /// Feed one quote; returns the side to trade, if any
    fn observe(&mut self, chain: Chain, token: &str, quote: Option<PairQuote>) -> Option<(Side, f64)> {
        let masked = mask(token);
        let (price, liq) = match quote.as_ref().map(|q| (q.price_usd, q.liquidity_usd)) {
            Some((Some(p), Some(l))) => (p, l),
            _ => {
                self.log_event(format!("⚠️ {} {}: no price/liquidity", chain, masked));
                return None;
            }
        };
        if liq < self.settings.min_liq_usd {
            self.log_event(format!(
                "❌ {} {} liq ${} < min ${}",
                chain,
                masked,
                round_to(liq, 0),
                round_to(self.settings.min_liq_usd, 0)
            ));
            return None;
        }

        let rsi_len = self.settings.rsi_len;
        let window = self
            .windows
            .entry(token.to_string())
            .or_insert_with(|| PriceWindow::new(rsi_len, WINDOW_CAPACITY));
        let prev = window.last();
        window.add(price);

        let brain = self.brains.entry(token.to_string()).or_default();
        if let Some(prev) = prev {
            brain.update((price - prev) / prev);
        }

        let window = &self.windows[token];
        let brain = &self.brains[token];
        let s_fast = window.sma(self.settings.sma_fast);
        let s_slow = window.sma(self.settings.sma_slow);
        let rsi = window.rsi();
        let ai_p = brain.prob_up();
        let samples = window.len();

        if self.cycle % INDICATOR_LOG_EVERY == 0 {
            let text = format!(
                "🧠 {} {} p=${} SMA{}/{}={}/{} RSI={} AI={}",
                chain,
                masked,
                round_to(price, 6),
                self.settings.sma_fast,
                self.settings.sma_slow,
                fmt_opt(s_fast, 6),
                fmt_opt(s_slow, 6),
                fmt_opt(rsi, 2),
                round_to(ai_p, 2)
            );
            self.log_event(text);
        }

        if tuning::is_due(&self.settings, samples, self.cycle) {
            let mut t = self.thresholds(token);
            let changed = tuning::retune(&self.settings, &self.windows[token], &self.brains[token], &mut t);
            if changed {
                self.tuned.insert(token.to_string(), t);
                self.log_event(format!(
                    "🔧 tuned {} AI={:.2}/{:.2} RSI={:.1}/{:.1}",
                    masked, t.ai_buy, t.ai_sell, t.rsi_buy, t.rsi_sell
                ));
            }
        }

        let t = self.thresholds(token);
        let (sig_buy, sig_sell) = match (s_fast, s_slow, rsi) {
            (Some(f), Some(s), Some(r)) => (
                f > s && r >= t.rsi_buy && ai_p >= t.ai_buy,
                f < s && r <= t.rsi_sell && ai_p <= t.ai_sell,
            ),
            _ => (false, false),
        };

        let have_pos = self.holds(token);
        if sig_buy && !have_pos {
            Some((Side::Buy, price))
        } else if sig_sell && have_pos {
            Some((Side::Sell, price))
        } else {
            None
        }
    }

    /// Paper fill at `price`; returns the reply and the fill, if one happened
    fn mock_fill(&mut self, chain: Chain, side: Side, token: &str, usd: f64, price: f64) -> (String, Option<MockFill>) {
        match side {
            Side::Buy => {
                let pos = self
                    .positions
                    .entry(token.to_string())
                    .or_insert_with(|| Position::new(chain));
                let units = usd / price.max(1e-9);
                let new_qty = pos.qty + units;
                pos.avg = if new_qty > 0.0 {
                    (pos.avg * pos.qty + usd) / new_qty
                } else {
                    price
                };
                pos.qty = new_qty;
                pos.chain = chain;
                if pos.opened_at.is_none() {
                    pos.opened_at = Some(now_iso());
                }
                let msg = format!(
                    "[MOCK FILL] buy {:.6} @ ${} pos={:.6}@{}",
                    units,
                    round_to(price, 6),
                    pos.qty,
                    round_to(pos.avg, 6)
                );
                (msg, Some(MockFill { units, realized: None }))
            }
            Side::Sell => {
                let Some(pos) = self.positions.get_mut(token).filter(|p| p.qty > 0.0) else {
                    return ("[MOCK] no position".to_string(), None);
                };
                let units = pos.qty.min(usd / price.max(1e-12));
                let realized = units * (price - pos.avg);
                pos.qty -= units;
                let remaining = pos.qty;
                self.pnl_usd += realized;
                let msg = if remaining <= POSITION_EPSILON {
                    self.positions.remove(token);
                    format!(
                        "[MOCK FILL] sell {:.6} @ ${} | flat | PnL+={}",
                        units,
                        round_to(price, 6),
                        round_to(self.pnl_usd, 2)
                    )
                } else {
                    format!(
                        "[MOCK FILL] sell {:.6} @ ${} | rem={:.6}",
                        units,
                        round_to(price, 6),
                        remaining
                    )
                };
                (msg, Some(MockFill { units, realized: Some(realized) }))
            }
        }
    }

    fn live_ready(&self, executor_wired: bool) -> bool {
        executor_wired
            && self.settings.execution_mode == "DEX"
            && (!self.settings.eth_token.is_empty() || !self.settings.bsc_token.is_empty())
    }

    fn portfolio(&self) -> PortfolioState {
        PortfolioState {
            positions: self.positions.clone(),
            pnl_usd: self.pnl_usd,
            saved_at: now_iso(),
        }
    }
}

struct MockFill {
    units: f64,
    realized: Option<f64>,
}

// ============================================
// Trade machine
// ============================================

pub struct TradeMachine {
    state: Mutex<EngineState>,
    fill_gate: AsyncMutex<()>,
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    executor: Option<Arc<dyn SwapExecutor>>,
    journal: Option<TradeJournal>,
    history: Option<TradeHistory>,
    state_path: Option<PathBuf>,
}

impl TradeMachine {
    pub fn new(
        settings: EngineSettings,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut state = EngineState {
            settings,
            paused: false,
            windows: HashMap::new(),
            brains: HashMap::new(),
            tuned: HashMap::new(),
            positions: BTreeMap::new(),
            pnl_usd: 0.0,
            cycle: 0,
            events: VecDeque::with_capacity(EVENTS_CAPACITY),
        };
        let s = &state.settings;
        let init = format!(
            "🤖 Engine init | mode={} | poll={}s | ETH={} BSC={} | autotune={} | minliq=${} | slip={}bps",
            s.mode,
            s.poll_seconds,
            mask(&s.eth_token),
            mask(&s.bsc_token),
            s.auto_tune,
            round_to(s.min_liq_usd, 0),
            s.slippage_bps
        );
        state.log_event(init);

        Self {
            state: Mutex::new(state),
            fill_gate: AsyncMutex::new(()),
            market,
            notifier,
            executor: None,
            journal: None,
            history: None,
            state_path: None,
        }
    }

    /// Live swap backend
    pub fn with_executor(mut self, executor: Arc<dyn SwapExecutor>) -> Self {
        self.executor = Some(executor);
        self.lock().log_event("🔗 Live DEX executor wired.");
        self
    }

    /// Journal, fill log and portfolio file; restores a saved portfolio
    pub fn with_storage(mut self, storage: &StorageSettings) -> Self {
        self.journal = Some(TradeJournal::new(&storage.journal_path));
        self.history = Some(TradeHistory::new(&storage.history_path));
        self.state_path = Some(storage.state_path.clone());

        match load_portfolio(&storage.state_path) {
            Ok(Some(saved)) => {
                let mut st = self.lock();
                let n = saved.positions.len();
                st.positions = saved.positions;
                st.pnl_usd = saved.pnl_usd;
                st.log_event(format!(
                    "💾 restored {} position(s), pnl≈{}",
                    n,
                    round_to(saved.pnl_usd, 2)
                ));
            }
            Ok(None) => {}
            Err(e) => warn!(code = e.code_str(), "⚠️ Portfolio not restored: {}", e.message),
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn notify(&self, text: &str) {
        let chat = self.lock().settings.alert_chat_id;
        if let Some(chat_id) = chat {
            send_logged(self.notifier.as_ref(), chat_id, text).await;
        }
    }

    pub fn journal(&self) -> Option<&TradeJournal> {
        self.journal.as_ref()
    }

    pub fn history(&self) -> Option<&TradeHistory> {
        self.history.as_ref()
    }

    // ============================================
    // Main loop
    // ============================================

    pub async fn run_cycle(&self) {
        let (cycle, tasks, allocation) = {
            let mut st = self.lock();
            if st.paused {
                return;
            }
            st.cycle += 1;
            let tasks = st.tasks();
            if tasks.is_empty() {
                if st.cycle % NO_TOKEN_HINT_EVERY == 1 {
                    st.log_event("No tokens configured. Use /seteth or /setbsc.");
                }
                return;
            }
            (st.cycle, tasks, st.settings.allocation_usd)
        };
        debug!(cycle, tokens = tasks.len(), "🔄 cycle");

        for (chain, token) in tasks {
            let quote = self.market.best_pair(&token).await;
            let gate = self.fill_gate.lock().await;
            let decision = self.lock().observe(chain, &token, quote);

            if let Some((side, price)) = decision {
                let res = self.execute_gated(chain, side, &token, allocation).await;
                drop(gate);
                let text = format!(
                    "{} {} {} {} @ ${} | {}",
                    side.emoji(),
                    side,
                    chain,
                    mask(&token),
                    round_to(price, 6),
                    res
                );
                self.lock().log_event(text);
                if res.starts_with("[LIVE ERROR]") {
                    self.notify(&format!("⚠️ cycle error {}:{}: {}", chain, mask(&token), res))
                        .await;
                }
            }
        }
    }

    // ============================================
    // Execution (mock + live)
    // ============================================

    pub async fn execute(&self, chain: Chain, side: Side, token: &str, usd: f64) -> String {
        let _gate = self.fill_gate.lock().await;
        self.execute_gated(chain, side, token, usd).await
    }

    /// `execute` for callers already holding the fill gate
    async fn execute_gated(&self, chain: Chain, side: Side, token: &str, usd: f64) -> String {
        let price = match self.market.best_pair(token).await.and_then(|q| q.price_usd) {
            Some(p) => p,
            None => return "[no price]".to_string(),
        };

        let mode = self.lock().settings.mode;
        match mode {
            TradeMode::Mock => self.execute_mock(chain, side, token, usd, price).await,
            TradeMode::Live => self.execute_live(chain, side, token, usd, price).await,
        }
    }

    async fn execute_mock(&self, chain: Chain, side: Side, token: &str, usd: f64, price: f64) -> String {
        let (msg, fill, portfolio) = {
            let mut st = self.lock();
            let (msg, fill) = st.mock_fill(chain, side, token, usd, price);
            let portfolio = fill.as_ref().map(|_| st.portfolio());
            (msg, fill, portfolio)
        };

        if let Some(fill) = fill {
            self.record_fill(HistoryEntry::new(
                chain,
                token,
                side,
                TradeMode::Mock,
                Some(fill.units),
                price,
                Some(fill.units * price),
                msg.clone(),
            ))
            .await;
            if let (Some(realized), Some(journal)) = (fill.realized, self.journal.clone()) {
                let token = token.to_string();
                write_off_runtime("Journal write", move || {
                    journal.record_trade(&token, realized, Outcome::from_profit(realized), "mock sell")
                })
                .await;
            }
            if let Some(portfolio) = portfolio {
                self.persist(portfolio).await;
            }
        }
        msg
    }

    async fn execute_live(&self, chain: Chain, side: Side, token: &str, usd: f64, price: f64) -> String {
        let (execution_mode, slippage) = {
            let st = self.lock();
            (st.settings.execution_mode.clone(), st.settings.slippage_bps)
        };
        if execution_mode != "DEX" {
            return "[LIVE disabled: EXECUTION_MODE must be DEX]".to_string();
        }
        let Some(executor) = self.executor.clone() else {
            return "[LIVE not ready: executor not wired]".to_string();
        };

        match side {
            Side::Buy => {
                let Some(base_usd) = self.market.base_price_usd(chain).await else {
                    return "[LIVE] base coin USD price unavailable".to_string();
                };
                let base_amt = (usd / base_usd).max(1e-9);
                match executor.buy(chain, token, base_amt, slippage).await {
                    Ok(tx) => {
                        self.notify(&format!("📝 LIVE BUY {} {} tx={}", chain, mask(token), tx))
                            .await;
                        let msg = format!(
                            "[LIVE] buy ${} → {}≈{} | tx={}",
                            round_to(usd, 2),
                            chain.native_symbol(),
                            round_to(base_amt, 6),
                            tx
                        );
                        self.record_fill(HistoryEntry::new(
                            chain,
                            token,
                            side,
                            TradeMode::Live,
                            Some(usd / price),
                            price,
                            Some(usd),
                            format!("tx={}", tx),
                        ))
                        .await;
                        msg
                    }
                    Err(e) => {
                        warn!(chain = %chain, token = %mask(token), "❌ live buy failed: {}", e);
                        format!("[LIVE ERROR] {}", e)
                    }
                }
            }
            Side::Sell => match executor.sell(chain, token, slippage).await {
                Ok(tx) => {
                    self.notify(&format!("📝 LIVE SELL {} {} tx={}", chain, mask(token), tx))
                        .await;
                    // amount sold is only known on-chain
                    self.record_fill(HistoryEntry::new(
                        chain,
                        token,
                        side,
                        TradeMode::Live,
                        None,
                        price,
                        None,
                        format!("full balance tx={}", tx),
                    ))
                    .await;
                    format!("[LIVE] sell full balance | tx={}", tx)
                }
                Err(e) => {
                    warn!(chain = %chain, token = %mask(token), "❌ live sell failed: {}", e);
                    format!("[LIVE ERROR] {}", e)
                }
            },
        }
    }

    async fn record_fill(&self, entry: HistoryEntry) {
        if let Some(history) = self.history.clone() {
            write_off_runtime("History write", move || history.append(entry)).await;
        }
    }

    async fn persist(&self, portfolio: PortfolioState) {
        if let Some(path) = self.state_path.clone() {
            write_off_runtime("State save", move || write_json(&path, &portfolio)).await;
        }
    }

    /// Write the paper portfolio now (used on shutdown)
    pub fn save_state(&self) -> AppResult<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let portfolio = self.lock().portfolio();
        write_json(path, &portfolio)
    }

    // ============================================
    // Manual trading
    // ============================================

    fn resolve_manual(&self, token: Option<&str>) -> Option<(Chain, String)> {
        let st = self.lock();
        let t = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .or_else(|| Some(st.settings.eth_token.clone()).filter(|t| !t.is_empty()))
            .or_else(|| Some(st.settings.bsc_token.clone()).filter(|t| !t.is_empty()))?;
        let chain = if t.eq_ignore_ascii_case(&st.settings.eth_token) {
            Chain::Eth
        } else if t.eq_ignore_ascii_case(&st.settings.bsc_token) {
            Chain::Bsc
        } else {
            Chain::Eth
        };
        Some((chain, t))
    }

    pub async fn manual_buy(&self, token: Option<&str>) -> String {
        let Some((chain, t)) = self.resolve_manual(token) else {
            return "Provide token: /buy <token_address> or configure ETH_TOKEN_ADDRESS/BSC_TOKEN_ADDRESS"
                .to_string();
        };
        let usd = self.lock().settings.allocation_usd;
        self.execute(chain, Side::Buy, &t, usd).await
    }

    pub async fn manual_sell(&self, token: Option<&str>) -> String {
        let Some((chain, t)) = self.resolve_manual(token) else {
            return "Provide token: /sell <token_address>".to_string();
        };
        let usd = self.lock().settings.allocation_usd;
        self.execute(chain, Side::Sell, &t, usd).await
    }

    /// Close everything: paper positions at market, or full-balance sells in live mode
    pub async fn panic_close_all(&self) -> String {
        let gate = self.fill_gate.lock().await;
        let (mode, targets) = {
            let st = self.lock();
            let targets: Vec<(Chain, String, f64)> = match st.settings.mode {
                TradeMode::Mock => st
                    .positions
                    .iter()
                    .map(|(t, p)| (p.chain, t.clone(), p.qty))
                    .collect(),
                TradeMode::Live => st.tasks().into_iter().map(|(c, t)| (c, t, 0.0)).collect(),
            };
            (st.settings.mode, targets)
        };

        if targets.is_empty() {
            return match mode {
                TradeMode::Mock => "🚨 PANIC: no open positions.".to_string(),
                TradeMode::Live => "🚨 PANIC: no tokens configured.".to_string(),
            };
        }

        let mut lines = vec![format!("🚨 PANIC close-all ({})", mode)];
        for (chain, token, qty) in targets {
            let res = match mode {
                TradeMode::Mock => {
                    match self.market.best_pair(&token).await.and_then(|q| q.price_usd) {
                        Some(price) => self.execute_mock(chain, Side::Sell, &token, qty * price, price).await,
                        None => "[no price]".to_string(),
                    }
                }
                TradeMode::Live => self.execute_gated(chain, Side::Sell, &token, 0.0).await,
            };
            lines.push(format!("• {} {}: {}", chain, mask(&token), res));
        }
        drop(gate);

        let summary = lines.join("\n");
        self.lock().log_event(format!("🚨 panic close-all ({})", mode));
        self.notify(&summary).await;
        summary
    }

    // ============================================
    // Admin & config
    // ============================================

    pub async fn pause(&self) -> String {
        {
            let mut st = self.lock();
            st.paused = true;
            st.log_event("⏸️ paused");
        }
        self.notify("⏸️ Engine paused").await;
        "⏸️ Engine paused".to_string()
    }

    pub async fn resume(&self) -> String {
        {
            let mut st = self.lock();
            st.paused = false;
            st.log_event("▶️ resumed");
        }
        self.notify("▶️ Engine resumed").await;
        "▶️ Engine resumed".to_string()
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn mode(&self) -> TradeMode {
        self.lock().settings.mode
    }

    pub async fn set_mode(&self, m: &str) -> String {
        let mode = TradeMode::parse(m);
        {
            let mut st = self.lock();
            st.settings.mode = mode;
            st.log_event(format!("⚙️ mode={}", mode));
        }
        if mode.is_live() && self.executor.is_none() {
            self.lock()
                .log_event("⚠️ live mode without a wired executor; trades will be refused");
        }
        let msg = format!("⚙️ Mode set to {}", mode);
        self.notify(&msg).await;
        msg
    }

    pub fn set_eth_token(&self, addr: &str) -> String {
        let mut st = self.lock();
        st.settings.eth_token = addr.trim().to_string();
        let msg = format!("ETH token set to {}", or_none(&st.settings.eth_token));
        st.log_event(msg.clone());
        msg
    }

    pub fn set_bsc_token(&self, addr: &str) -> String {
        let mut st = self.lock();
        st.settings.bsc_token = addr.trim().to_string();
        let msg = format!("BSC token set to {}", or_none(&st.settings.bsc_token));
        st.log_event(msg.clone());
        msg
    }

    pub fn set_allocation(&self, usd: f64) -> String {
        let mut st = self.lock();
        let usd = if usd.is_finite() { usd } else { MIN_ALLOCATION_USD };
        st.settings.allocation_usd = usd.max(MIN_ALLOCATION_USD);
        let msg = format!("Allocation set to ${:.2}", st.settings.allocation_usd);
        st.log_event(msg.clone());
        msg
    }

    pub fn set_poll(&self, seconds: u64) -> String {
        let mut st = self.lock();
        st.settings.poll_seconds = seconds.max(MIN_POLL_SECONDS_RUNTIME);
        let msg = format!("Poll set to {}s", st.settings.poll_seconds);
        st.log_event(msg.clone());
        msg
    }

    pub fn set_slippage(&self, bps: u32) -> String {
        let mut st = self.lock();
        st.settings.slippage_bps = bps.max(1);
        let msg = format!("Slippage set to {}bps", st.settings.slippage_bps);
        st.log_event(msg.clone());
        msg
    }

    pub fn set_min_liq(&self, usd: f64) -> String {
        let mut st = self.lock();
        let usd = if usd.is_finite() { usd } else { 0.0 };
        st.settings.min_liq_usd = usd.max(0.0);
        let msg = format!("Min liquidity set to ${}", with_commas(st.settings.min_liq_usd));
        st.log_event(msg.clone());
        msg
    }

    pub fn poll_seconds(&self) -> u64 {
        self.lock().settings.poll_seconds
    }

    pub fn allocation_usd(&self) -> f64 {
        self.lock().settings.allocation_usd
    }

    pub fn pnl_usd(&self) -> f64 {
        self.lock().pnl_usd
    }

    pub fn cycle(&self) -> u64 {
        self.lock().cycle
    }

    pub fn thresholds_for(&self, token: &str) -> Thresholds {
        self.lock().thresholds(token)
    }

    // ============================================
    // Reporting
    // ============================================

    pub fn short_status(&self) -> String {
        let st = self.lock();
        format!(
            "mode={} paused={} positions={} pnl≈{}",
            st.settings.mode,
            st.paused,
            st.positions.len(),
            round_to(st.pnl_usd, 2)
        )
    }

    pub fn status_text(&self) -> String {
        let mut lines = {
            let st = self.lock();
            let s = &st.settings;
            vec![
                format!("Mode: {}", s.mode),
                format!("Paused: {}", st.paused),
                format!("Positions: {}", st.positions.len()),
                format!("PnL est: {}", round_to(st.pnl_usd, 2)),
                format!("Poll: {}s", s.poll_seconds),
                format!("Allocation: ${:.2}", s.allocation_usd),
                format!("ETH token: {}", or_none(&s.eth_token)),
                format!("BSC token: {}", or_none(&s.bsc_token)),
                format!("SMA: fast={} slow={}", s.sma_fast, s.sma_slow),
                format!("RSI len: {}", s.rsi_len),
                format!(
                    "Slippage: {} bps | MinLiq: ${}",
                    s.slippage_bps,
                    round_to(s.min_liq_usd, 0)
                ),
                format!(
                    "AUTO_TUNE={} | WARMUP={} | EVERY={} | LOCK_TUNED={}",
                    s.auto_tune, s.tune_warmup, s.tune_every, s.lock_tuned
                ),
            ]
        };
        if self.mode().is_live() {
            lines.push(self.live_ready_report());
        }
        lines.join("\n")
    }

    /// Human-readable checklist for live mode
    pub fn live_ready_report(&self) -> String {
        let st = self.lock();
        let s = &st.settings;
        let ok = |b: bool| if b { "✅" } else { "❌" };
        let checks = [
            format!("{} EXECUTION_MODE={}", ok(s.execution_mode == "DEX"), s.execution_mode),
            format!("{} RPC url(s)", ok(s.has_rpc_url)),
            format!("{} private key(s)", ok(s.has_private_key)),
            format!("{} DexExecutor wired", ok(self.executor.is_some())),
            format!(
                "{} token configured",
                ok(!s.eth_token.is_empty() || !s.bsc_token.is_empty())
            ),
            format!("{} slippage={}bps", ok(s.slippage_bps > 0), s.slippage_bps),
            format!("{} min_liq=${}", ok(s.min_liq_usd >= 0.0), round_to(s.min_liq_usd, 0)),
        ];
        let body: Vec<String> = checks.iter().map(|c| format!("• {}", c)).collect();
        format!("LIVE readiness:\n{}", body.join("\n"))
    }

    pub fn recent_events(&self, n: usize) -> Vec<String> {
        let st = self.lock();
        let skip = st.events.len().saturating_sub(n);
        st.events.iter().skip(skip).cloned().collect()
    }

    pub fn recent_events_text(&self, n: Option<usize>) -> String {
        let events = self.recent_events(n.unwrap_or(DEFAULT_EVENTS_SHOWN));
        if events.is_empty() {
            return "No recent events.".to_string();
        }
        format!("🗞️ Recent events:\n{}", events.join("\n"))
    }

    /// Open positions valued at the current best-pair price
    pub async fn positions(&self) -> Vec<PositionView> {
        let held: Vec<(String, Position)> = self
            .lock()
            .positions
            .iter()
            .map(|(t, p)| (t.clone(), p.clone()))
            .collect();

        let mut out = Vec::with_capacity(held.len());
        for (token, pos) in held {
            let price = self
                .market
                .best_pair(&token)
                .await
                .and_then(|q| q.price_usd)
                .unwrap_or(0.0);
            out.push(PositionView {
                chain: pos.chain,
                token,
                qty: pos.qty,
                avg_price: pos.avg,
                market_value: price * pos.qty,
                opened_at: pos.opened_at,
            });
        }
        out
    }

    pub async fn positions_text(&self) -> String {
        let views = self.positions().await;
        if views.is_empty() {
            return "No open positions.".to_string();
        }
        let mut lines = vec!["📂 Positions:".to_string()];
        for v in views {
            lines.push(format!(
                "• {} {} qty={:.6} avg=${} value≈${}",
                v.chain,
                mask(&v.token),
                v.qty,
                round_to(v.avg_price, 6),
                round_to(v.market_value, 2)
            ));
        }
        lines.join("\n")
    }

    /// Realized PnL plus the per-token journal
    pub fn profit_text(&self) -> String {
        let mut lines = vec![format!("💰 Realized PnL: ${}", round_to(self.pnl_usd(), 2))];
        match self.journal.as_ref().map(|j| j.summary()) {
            Some(Ok(summary)) if !summary.is_empty() => {
                for (token, row) in summary {
                    lines.push(format!(
                        "• {} trades={} win={}% profit=${}",
                        mask(&token),
                        row.trades,
                        row.win_rate,
                        round_to(row.profit, 2)
                    ));
                }
            }
            Some(Err(e)) => lines.push(format!("⚠️ journal unavailable: {}", e.message)),
            _ => lines.push("No journaled trades yet.".to_string()),
        }
        lines.join("\n")
    }

    /// Scam screen for a token, judged against the learned selectivity
    pub async fn screen_token(&self, token: &str) -> String {
        let token = token.trim();
        let Some(quote) = self.market.best_pair(token).await else {
            return format!("No pairs found for {}", mask(token));
        };
        let threshold = self
            .journal
            .as_ref()
            .and_then(|j| j.selectivity_threshold().ok())
            .unwrap_or(crate::core::journal::DEFAULT_SELECTIVITY);
        let verdict = screening::screen(&quote, chrono::Utc::now().timestamp_millis());

        let mut lines = vec![
            format!(
                "{} {} ({}) on {}",
                verdict.emoji(),
                or_none(&quote.name),
                or_none(&quote.symbol),
                or_none(&quote.chain_id)
            ),
            format!(
                "Price: ${} | Liquidity: ${}",
                fmt_opt(quote.price_usd, 8),
                with_commas(quote.liquidity_usd.unwrap_or(0.0))
            ),
            format!(
                "Score: {}/100 (threshold {}) → {}",
                verdict.score,
                threshold,
                if verdict.passes(threshold) { "PASS" } else { "SKIP" }
            ),
        ];
        for r in &verdict.reasons {
            lines.push(format!("• {}", r));
        }
        lines.join("\n")
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let wired = self.executor.is_some();
        let recent = self.recent_events(DEFAULT_EVENTS_SHOWN);
        let st = self.lock();
        let s = &st.settings;
        EngineSnapshot {
            mode: s.mode,
            paused: st.paused,
            cycle: st.cycle,
            poll_seconds: s.poll_seconds,
            allocation_usd: s.allocation_usd,
            slippage_bps: s.slippage_bps,
            min_liq_usd: s.min_liq_usd,
            eth_token: s.eth_token.clone(),
            bsc_token: s.bsc_token.clone(),
            positions: st.positions.len(),
            pnl_usd: st.pnl_usd,
            live_ready: st.live_ready(wired),
            thresholds: st
                .tasks()
                .into_iter()
                .map(|(_, t)| {
                    let th = st.thresholds(&t);
                    (t, th)
                })
                .collect(),
            recent_events: recent,
        }
    }
}

/// Run a blocking store write on the blocking pool; failures are logged
async fn write_off_runtime<F>(what: &'static str, write: F)
where
    F: FnOnce() -> AppResult<()> + Send + 'static,
{
    match tokio::task::spawn_blocking(write).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(code = e.code_str(), "⚠️ {} failed: {}", what, e.message),
        Err(e) => warn!("⚠️ {} task failed: {}", what, e),
    }
}

fn load_portfolio(path: &std::path::Path) -> AppResult<Option<PortfolioState>> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::store_corrupt(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::store_read(path, e)),
    }
}
