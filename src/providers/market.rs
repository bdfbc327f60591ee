//! Market data seam
//!
//! The engine only sees `MarketData`. The live implementation combines
//! DexScreener (pair price/liquidity) and CoinGecko (native coin price),
//! retrying transient failures with exponential backoff and jitter.
//! Failures after the last retry are logged and read as "no data".

use async_trait::async_trait;
use eyre::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::errors::AppError;
use crate::models::types::{Chain, PairQuote};
use crate::providers::coingecko::CoinGeckoClient;
use crate::providers::dexscreener::DexScreenerClient;
use crate::utils::constants::{MARKET_BASE_RETRY_MS, MARKET_MAX_RETRIES, RETRY_JITTER_PERCENT};

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Deepest pair for a token across all chains
    async fn best_pair(&self, token: &str) -> Option<PairQuote>;

    /// USD price of the chain's native coin
    async fn base_price_usd(&self, chain: Chain) -> Option<f64>;
}

pub struct MarketClient {
    dexscreener: DexScreenerClient,
    coingecko: CoinGeckoClient,
    max_retries: u32,
}

impl Default for MarketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketClient {
    pub fn new() -> Self {
        Self {
            dexscreener: DexScreenerClient::new(),
            coingecko: CoinGeckoClient::new(),
            max_retries: MARKET_MAX_RETRIES,
        }
    }
}

#[async_trait]
impl MarketData for MarketClient {
    async fn best_pair(&self, token: &str) -> Option<PairQuote> {
        match with_retry("dexscreener", self.max_retries, || {
            self.dexscreener.best_quote(token)
        })
        .await
        {
            Ok(q) => q,
            Err(e) => {
                warn!(code = error_code(&e), token = %token, "⚠️ Dexscreener error: {}", e);
                None
            }
        }
    }

    async fn base_price_usd(&self, chain: Chain) -> Option<f64> {
        match with_retry("coingecko", self.max_retries, || {
            self.coingecko.native_price_usd(chain)
        })
        .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(code = error_code(&e), chain = %chain, "⚠️ CoinGecko error: {}", e);
                None
            }
        }
    }
}

/// Code of the `AppError` behind a provider failure
pub fn error_code(err: &eyre::Report) -> &'static str {
    err.downcast_ref::<AppError>()
        .map(AppError::code_str)
        .unwrap_or("UNKNOWN_ERROR")
}

/// Backoff before attempt `attempt` (1-based retries): base * 2^(attempt-1) ± jitter
pub fn backoff_delay_ms(attempt: u32) -> u64 {
    let base_delay = MARKET_BASE_RETRY_MS * 2_u64.pow(attempt.saturating_sub(1));
    let jitter_range = (base_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 =
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    (base_delay as i64 + jitter).max(50) as u64
}

/// Run `op` up to `max_attempts` times, sleeping with jittered backoff between tries
pub async fn with_retry<T, F, Fut>(label: &str, max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = backoff_delay_ms(attempt);
            debug!("⏳ {} retry {}/{} after {}ms", label, attempt + 1, attempts, delay);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if e.to_string().contains("429") {
                    warn!("⏳ {} rate limited, backing off (attempt {}/{})", label, attempt + 1, attempts);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| eyre::eyre!("{} failed after {} attempts", label, attempts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows_with_jitter_bounds() {
        for _ in 0..20 {
            let d1 = backoff_delay_ms(1);
            assert!((200..=300).contains(&d1), "d1={}", d1);
            let d3 = backoff_delay_ms(3);
            assert!((800..=1200).contains(&d3), "d3={}", d3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let out = with_retry("test", 3, || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(eyre::eyre!("HTTP 503"))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_error_code_of_provider_failure() {
        let err = eyre::eyre!(AppError::dexscreener_error("HTTP 429"));
        assert_eq!(error_code(&err), "MARKET_DEXSCREENER_ERROR");
        assert_eq!(error_code(&eyre::eyre!("plain")), "UNKNOWN_ERROR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let res: Result<()> = with_retry("test", 2, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(eyre::eyre!("boom"))
        })
        .await;
        assert!(res.unwrap_err().to_string().contains("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
