//! Providers Module - External Service Integrations
//!
//! Market data (DexScreener, CoinGecko) and on-chain execution (alloy).

pub mod coingecko;
pub mod dex_executor;
pub mod dexscreener;
pub mod market;

pub use coingecko::CoinGeckoClient;
pub use dex_executor::{DexExecutor, SwapExecutor};
pub use dexscreener::{DexPair, DexScreenerClient};
pub use market::{MarketClient, MarketData};
