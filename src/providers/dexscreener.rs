//! DexScreener API Client
//!
//! Source of the bot's price and liquidity feed. For a token address the
//! API returns every pair across every chain; the bot trades off the pair
//! with the deepest USD liquidity.
//!
//! API: https://api.dexscreener.com/latest/dex/tokens/{tokenAddress}
//! Free, no API key required

use eyre::{eyre, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::models::errors::AppError;
use crate::models::types::PairQuote;
use crate::utils::constants::{DEXSCREENER_BASE_URL, DEXSCREENER_TIMEOUT_SECS, USER_AGENT};

/// DexScreener API response
#[derive(Debug, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// A trading pair from DexScreener
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    /// Chain ID (e.g., "ethereum", "bsc")
    #[serde(default)]
    pub chain_id: String,
    /// DEX identifier (e.g., "uniswap", "pancakeswap")
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: String,
    pub base_token: Option<DexToken>,
    pub liquidity: Option<DexLiquidity>,
    /// Price in USD, sent as a decimal string
    pub price_usd: Option<String>,
    pub price_change: Option<DexPriceChange>,
    /// Unix milliseconds
    pub pair_created_at: Option<i64>,
}

impl DexPair {
    /// USD liquidity, 0 when missing
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    /// Parsed USD price; zero or unparsable is no price
    pub fn price(&self) -> Option<f64> {
        self.price_usd
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn to_quote(&self) -> PairQuote {
        let liq = self.liquidity_usd();
        let token = self.base_token.clone().unwrap_or_default();
        PairQuote {
            price_usd: self.price(),
            liquidity_usd: (liq > 0.0).then_some(liq),
            chain_id: self.chain_id.clone(),
            dex_id: self.dex_id.clone(),
            pair_address: self.pair_address.clone(),
            name: token.name.unwrap_or_default(),
            symbol: token.symbol.unwrap_or_default(),
            pair_created_at_ms: self.pair_created_at,
            price_change_24h: self.price_change.as_ref().and_then(|c| c.h24),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexToken {
    #[serde(default)]
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLiquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexPriceChange {
    pub h24: Option<f64>,
}

/// Deepest pair by USD liquidity; the first one wins ties
pub fn best_pair(pairs: &[DexPair]) -> Option<&DexPair> {
    pairs.iter().fold(None, |best: Option<&DexPair>, p| match best {
        Some(b) if b.liquidity_usd() >= p.liquidity_usd() => Some(b),
        _ => Some(p),
    })
}

/// DexScreener API client
pub struct DexScreenerClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DexScreenerClient {
    pub fn new() -> Self {
        Self::with_base_url(DEXSCREENER_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEXSCREENER_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch all pairs for a token address
    pub async fn get_token_pairs(&self, token_address: &str) -> Result<Vec<DexPair>> {
        let token = token_address.trim();
        if token.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/tokens/{}", self.base_url, token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                eyre!(AppError::dexscreener_error(format!("DexScreener request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            return Err(eyre!(AppError::dexscreener_error(format!(
                "DexScreener API error: {}",
                response.status()
            ))));
        }

        let data: DexScreenerResponse = response.json().await.map_err(|e| {
            eyre!(AppError::dexscreener_error(format!(
                "Failed to parse DexScreener response: {}",
                e
            )))
        })?;

        let pairs = data.pairs.unwrap_or_default();
        debug!(token = %token, pairs = pairs.len(), "📊 DexScreener pairs");
        Ok(pairs)
    }

    /// Snapshot of the deepest pair, `None` when the token has no pairs
    pub async fn best_quote(&self, token_address: &str) -> Result<Option<PairQuote>> {
        let pairs = self.get_token_pairs(token_address).await?;
        Ok(best_pair(&pairs).map(DexPair::to_quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pairs": [
            {
                "chainId": "ethereum",
                "dexId": "uniswap",
                "pairAddress": "0xpairA",
                "baseToken": {"address": "0xtok", "name": "Tiger", "symbol": "TGR"},
                "priceUsd": "0.0123",
                "liquidity": {"usd": 120000.5, "base": 1, "quote": 2},
                "priceChange": {"h24": -3.2},
                "pairCreatedAt": 1700000000000
            },
            {
                "chainId": "bsc",
                "dexId": "pancakeswap",
                "pairAddress": "0xpairB",
                "baseToken": {"address": "0xtok", "name": "Tiger", "symbol": "TGR"},
                "priceUsd": "0.0125",
                "liquidity": {"usd": 450000.0}
            },
            {
                "chainId": "bsc",
                "dexId": "biswap",
                "pairAddress": "0xpairC",
                "baseToken": {"address": "0xtok"},
                "priceUsd": "0.02"
            }
        ]
    }"#;

    fn sample_pairs() -> Vec<DexPair> {
        let resp: DexScreenerResponse = serde_json::from_str(SAMPLE).unwrap();
        resp.pairs.unwrap()
    }

    #[test]
    fn test_parse_response() {
        let pairs = sample_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].pair_created_at, Some(1_700_000_000_000));
        assert_eq!(pairs[2].liquidity_usd(), 0.0);
    }

    #[test]
    fn test_best_pair_is_deepest_across_chains() {
        let pairs = sample_pairs();
        let best = best_pair(&pairs).unwrap();
        assert_eq!(best.pair_address, "0xpairB");

        let q = best.to_quote();
        assert_eq!(q.price_usd, Some(0.0125));
        assert_eq!(q.liquidity_usd, Some(450_000.0));
        assert_eq!(q.chain_id, "bsc");
        assert_eq!(q.symbol, "TGR");
    }

    #[test]
    fn test_zero_price_and_liquidity_are_none() {
        let raw = r#"{"pairs":[{"chainId":"bsc","priceUsd":"0","liquidity":{"usd":0}}]}"#;
        let resp: DexScreenerResponse = serde_json::from_str(raw).unwrap();
        let pairs = resp.pairs.unwrap();
        let q = best_pair(&pairs).unwrap().to_quote();
        assert_eq!(q.price_usd, None);
        assert_eq!(q.liquidity_usd, None);
    }

    #[test]
    fn test_null_pairs() {
        let resp: DexScreenerResponse = serde_json::from_str(r#"{"pairs":null}"#).unwrap();
        assert!(best_pair(&resp.pairs.unwrap_or_default()).is_none());
    }
}
