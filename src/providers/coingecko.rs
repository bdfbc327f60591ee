//! CoinGecko simple-price client, used to size live buys in ETH/BNB.

use eyre::{eyre, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::errors::AppError;
use crate::models::types::Chain;
use crate::utils::constants::{COINGECKO_BASE_URL, COINGECKO_TIMEOUT_SECS, USER_AGENT};

/// `{"ethereum": {"usd": 3012.5}}`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoClient {
    pub fn new() -> Self {
        Self::with_base_url(COINGECKO_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(COINGECKO_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// USD price of the chain's native coin
    pub async fn native_price_usd(&self, chain: Chain) -> Result<Option<f64>> {
        let id = chain.coingecko_id();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| eyre!(AppError::coingecko_error(format!("CoinGecko request failed: {}", e))))?;

        if !response.status().is_success() {
            return Err(eyre!(AppError::coingecko_error(format!(
                "CoinGecko API error: {}",
                response.status()
            ))));
        }

        let body: SimplePriceResponse = response.json().await.map_err(|e| {
            eyre!(AppError::coingecko_error(format!(
                "Failed to parse CoinGecko response: {}",
                e
            )))
        })?;

        Ok(extract_usd(&body, id))
    }
}

/// Positive finite USD price for `id`
pub fn extract_usd(body: &SimplePriceResponse, id: &str) -> Option<f64> {
    body.get(id)
        .and_then(|m| m.get("usd"))
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_usd() {
        let body: SimplePriceResponse =
            serde_json::from_str(r#"{"binancecoin":{"usd":612.4}}"#).unwrap();
        assert_eq!(extract_usd(&body, "binancecoin"), Some(612.4));
        assert_eq!(extract_usd(&body, "ethereum"), None);
    }

    #[test]
    fn test_zero_price_is_none() {
        let body: SimplePriceResponse =
            serde_json::from_str(r#"{"ethereum":{"usd":0}}"#).unwrap();
        assert_eq!(extract_usd(&body, "ethereum"), None);
    }
}
