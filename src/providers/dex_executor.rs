//! DEX Executor - live swaps through Uniswap-V2 style routers
//!
//! - ETH: Uniswap V2 router, path through WETH
//! - BSC: PancakeSwap V2 router, path through WBNB
//!
//! Buys spend native coin (`swapExactETHForTokensSupportingFeeOnTransferTokens`),
//! sells dump the whole token balance (`swapExactTokensForETHSupportingFeeOnTransferTokens`).
//! Both use `getAmountsOut` minus slippage as the minimum output.
//!
//! Private keys are only ever handed to the signer; they are never logged.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::str::FromStr;
use tracing::{info, warn};

use crate::models::config::{ChainWallet, LiveSettings};
use crate::models::errors::AppError;
use crate::models::types::Chain;
use crate::utils::constants::{apply_slippage, eth_to_wei, wei_to_eth, SWAP_DEADLINE_SECS};

sol! {
    #[sol(rpc)]
    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external view returns (uint256[] memory amounts);

        function swapExactETHForTokensSupportingFeeOnTransferTokens(
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external payable;

        function swapExactTokensForETHSupportingFeeOnTransferTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external;
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// On-chain execution seam used by the engine in live mode
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Spend `base_amount` of the native coin on `token`; returns the tx hash
    async fn buy(&self, chain: Chain, token: &str, base_amount: f64, slippage_bps: u32)
        -> Result<String>;

    /// Sell the wallet's whole `token` balance; returns the tx hash
    async fn sell(&self, chain: Chain, token: &str, slippage_bps: u32) -> Result<String>;
}

/// Resolved addresses and signer for one chain
struct ChainRoute {
    rpc_url: String,
    signer: PrivateKeySigner,
    router: Address,
    wrapped_native: Address,
}

impl ChainRoute {
    fn from_wallet(chain: Chain, wallet: &ChainWallet) -> Result<Option<Self>> {
        let (Some(rpc_url), Some(key)) = (&wallet.rpc_url, &wallet.private_key) else {
            return Ok(None);
        };
        let signer = PrivateKeySigner::from_str(key.trim().trim_start_matches("0x"))
            .map_err(|_| eyre!("invalid private key for {}", chain))?;
        Ok(Some(Self {
            rpc_url: rpc_url.clone(),
            signer,
            router: parse_address(&wallet.router)?,
            wrapped_native: parse_address(&wallet.wrapped_native)?,
        }))
    }
}

pub struct DexExecutor {
    eth: Option<ChainRoute>,
    bsc: Option<ChainRoute>,
    gas_limit: u64,
}

impl DexExecutor {
    /// Wire every chain that has both an RPC URL and a key; errors if none does
    pub fn from_config(live: &LiveSettings) -> Result<Self> {
        let eth = ChainRoute::from_wallet(Chain::Eth, live.wallet(Chain::Eth))?;
        let bsc = ChainRoute::from_wallet(Chain::Bsc, live.wallet(Chain::Bsc))?;
        if eth.is_none() && bsc.is_none() {
            return Err(eyre!(
                "no chain has both an RPC URL and a private key configured"
            ));
        }
        for (chain, route) in [(Chain::Eth, &eth), (Chain::Bsc, &bsc)] {
            if let Some(r) = route {
                info!(chain = %chain, wallet = %r.signer.address(), "🔗 Live route wired");
            }
        }
        Ok(Self {
            eth,
            bsc,
            gas_limit: live.gas_limit,
        })
    }

    pub fn is_wired(&self, chain: Chain) -> bool {
        self.route(chain).is_ok()
    }

    fn route(&self, chain: Chain) -> Result<&ChainRoute> {
        let route = match chain {
            Chain::Eth => self.eth.as_ref(),
            Chain::Bsc => self.bsc.as_ref(),
        };
        route.ok_or_else(|| eyre!(AppError::missing_wallet(chain.label())))
    }
}

#[async_trait]
impl SwapExecutor for DexExecutor {
    async fn buy(
        &self,
        chain: Chain,
        token: &str,
        base_amount: f64,
        slippage_bps: u32,
    ) -> Result<String> {
        let route = self.route(chain)?;
        let token = parse_address(token)?;
        let owner = route.signer.address();

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(route.signer.clone()))
            .on_http(route.rpc_url.parse().map_err(|e| eyre!("bad RPC url: {}", e))?);

        let router = IUniswapV2Router02::new(route.router, &provider);
        let path = vec![route.wrapped_native, token];

        let wei_in = eth_to_wei(base_amount);
        if wei_in.is_zero() {
            return Err(eyre!("buy amount rounds to zero"));
        }

        let amounts = router
            .getAmountsOut(wei_in, path.clone())
            .call()
            .await
            .map_err(|e| eyre!("getAmountsOut failed: {}", e))?
            .amounts;
        let quoted = amounts.last().copied().unwrap_or(U256::ZERO);
        let out_min = apply_slippage(quoted, slippage_bps);

        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| eyre!("gas price unavailable: {}", e))?;

        let pending = router
            .swapExactETHForTokensSupportingFeeOnTransferTokens(out_min, path, owner, deadline())
            .value(wei_in)
            .gas(self.gas_limit)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(|e| eyre!(AppError::swap_failed(format!("buy send failed: {}", e))))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        info!(chain = %chain, token = %token, tx = %tx_hash, "📝 Live buy sent");
        Ok(tx_hash)
    }

    async fn sell(&self, chain: Chain, token: &str, slippage_bps: u32) -> Result<String> {
        let route = self.route(chain)?;
        let token = parse_address(token)?;
        let owner = route.signer.address();

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(route.signer.clone()))
            .on_http(route.rpc_url.parse().map_err(|e| eyre!("bad RPC url: {}", e))?);

        let erc20 = IERC20::new(token, &provider);
        let router = IUniswapV2Router02::new(route.router, &provider);

        let balance = erc20
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| eyre!("balanceOf failed: {}", e))?
            ._0;
        if balance.is_zero() {
            return Err(eyre!(AppError::no_balance()));
        }

        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| eyre!("gas price unavailable: {}", e))?;

        let allowance = erc20
            .allowance(owner, route.router)
            .call()
            .await
            .map_err(|e| eyre!("allowance failed: {}", e))?
            ._0;
        if allowance < balance {
            let approve = erc20
                .approve(route.router, balance)
                .gas(self.gas_limit)
                .gas_price(gas_price)
                .send()
                .await
                .map_err(|e| eyre!(AppError::swap_failed(format!("approve failed: {}", e))))?;
            let approve_hash = approve
                .watch()
                .await
                .map_err(|e| eyre!(AppError::swap_failed(format!("approve not mined: {}", e))))?;
            info!(chain = %chain, tx = ?approve_hash, "✅ Router approved");
        }

        let path = vec![token, route.wrapped_native];
        let amounts = router
            .getAmountsOut(balance, path.clone())
            .call()
            .await
            .map_err(|e| eyre!("getAmountsOut failed: {}", e))?
            .amounts;
        let quoted = amounts.last().copied().unwrap_or(U256::ZERO);
        if quoted.is_zero() {
            warn!(chain = %chain, token = %token, "⚠️ Router quotes zero output");
        }
        let out_min = apply_slippage(quoted, slippage_bps);

        let pending = router
            .swapExactTokensForETHSupportingFeeOnTransferTokens(
                balance,
                out_min,
                path,
                owner,
                deadline(),
            )
            .gas(self.gas_limit)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(|e| eyre!(AppError::swap_failed(format!("sell send failed: {}", e))))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        info!(
            chain = %chain,
            token = %token,
            min_out = wei_to_eth(out_min),
            tx = %tx_hash,
            "📝 Live sell sent"
        );
        Ok(tx_hash)
    }
}

fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim())
        .map_err(|_| eyre!(AppError::invalid_address(format!("invalid address: {}", s.trim()))))
}

fn deadline() -> U256 {
    U256::from(chrono::Utc::now().timestamp().max(0) as u64 + SWAP_DEADLINE_SECS)
}
