use alloy::primitives::{Address, Bytes, U256};
use fastnum::UD256;

use super::TokenMetadata;

/// Trade quote for rebalancing one Set component into another.
#[derive(Clone, derive_more::Debug)]
pub struct TradeQuote {
    /// Set token the trade is executed for.
    pub from: Address,
    pub from_token: Address,
    pub to_token: Address,
    /// Name of the exchange adapter `calldata` is meant for.
    pub exchange_adapter_name: &'static str,
    pub calldata: Bytes,
    /// Estimated gas of the trade transaction, including the wrapping overhead.
    pub gas: u64,
    /// Gas price in gwei.
    #[debug("{gas_price}")]
    pub gas_price: UD256,
    /// Tolerance applied to [`Self::to_units`], e.g. `"2.00%"`.
    pub slippage_percentage: String,
    /// Total amount of `from_token` sold by the Set, in base units.
    pub from_token_amount: U256,
    /// Total amount of `to_token` quoted for the sale, in base units.
    pub to_token_amount: U256,
    /// Units of `from_token` debited per Set (rounded up).
    pub from_units: U256,
    /// Units of `to_token` credited per Set, after slippage tolerance (rounded down).
    pub to_units: U256,
    pub display: TradeQuoteDisplay,
}

/// Human readable part of the [`TradeQuote`].
#[derive(Clone, derive_more::Debug)]
pub struct TradeQuoteDisplay {
    #[debug("{from_token_amount}")]
    pub from_token_amount: UD256,
    #[debug("{to_token_amount}")]
    pub to_token_amount: UD256,
    /// USD value of the sold amount, e.g. `"$1,234.56"`.
    pub from_token_price_usd: String,
    /// USD value of the quoted bought amount.
    pub to_token_price_usd: String,
    pub gas_costs_usd: String,
    /// Gas costs in the native currency of the chain, e.g. `"0.012345 ETH"`.
    pub gas_costs_chain_currency: String,
    pub fee_percentage: String,
    /// Realized slippage between the USD values of the quoted amounts.
    ///
    /// Computed from the quoted amounts before the tolerance is applied,
    /// so it differs from [`TradeQuote::slippage_percentage`].
    pub slippage: String,
    pub from_token: TokenMetadata,
    pub to_token: TokenMetadata,
}
