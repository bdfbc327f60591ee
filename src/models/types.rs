//! Type definitions for Stripe Tiger
//! Core data structures shared by the engine, providers and API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chains the bot trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "BSC")]
    Bsc,
}

impl Chain {
    /// Short label used in chat and events
    pub fn label(&self) -> &'static str {
        match self {
            Chain::Eth => "ETH",
            Chain::Bsc => "BSC",
        }
    }

    /// CoinGecko id of the native coin
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Chain::Eth => "ethereum",
            Chain::Bsc => "binancecoin",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Eth => "ETH",
            Chain::Bsc => "BNB",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Paper or on-chain execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    #[default]
    Mock,
    Live,
}

impl TradeMode {
    /// Anything but `live` is mock
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("live") {
            TradeMode::Live
        } else {
            TradeMode::Mock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::Mock => "mock",
            TradeMode::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, TradeMode::Live)
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Side::Buy => "🟢",
            Side::Sell => "🔴",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open paper position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub qty: f64,
    pub avg: f64,
    pub chain: Chain,
    /// ISO-8601 time of the first fill
    pub opened_at: Option<String>,
}

impl Position {
    pub fn new(chain: Chain) -> Self {
        Self {
            qty: 0.0,
            avg: 0.0,
            chain,
            opened_at: None,
        }
    }
}

/// Best-pair snapshot for a token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairQuote {
    /// `None` when the pair reports no price or a zero price
    pub price_usd: Option<f64>,
    /// `None` when liquidity is missing or non-positive
    pub liquidity_usd: Option<f64>,
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub name: String,
    pub symbol: String,
    /// Pair creation time, unix milliseconds
    pub pair_created_at_ms: Option<i64>,
    pub price_change_24h: Option<f64>,
}

impl PairQuote {
    /// Age of the pair in days relative to `now_ms`
    pub fn age_days(&self, now_ms: i64) -> Option<f64> {
        self.pair_created_at_ms
            .map(|created| ((now_ms - created).max(0) as f64) / 86_400_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_mode_parse() {
        assert_eq!(TradeMode::parse("LIVE"), TradeMode::Live);
        assert_eq!(TradeMode::parse("mock"), TradeMode::Mock);
        assert_eq!(TradeMode::parse("paper"), TradeMode::Mock);
    }

    #[test]
    fn test_pair_age() {
        let q = PairQuote {
            pair_created_at_ms: Some(0),
            ..Default::default()
        };
        let age = q.age_days(3 * 86_400_000).unwrap();
        assert!((age - 3.0).abs() < 1e-9);
        assert_eq!(PairQuote::default().age_days(1), None);
    }

    #[test]
    fn test_chain_serde_label() {
        let json = serde_json::to_string(&Chain::Bsc).unwrap();
        assert_eq!(json, "\"BSC\"");
        assert_eq!(Chain::Bsc.to_string(), "BSC");
        assert_eq!(Chain::Bsc.native_symbol(), "BNB");
    }
}
