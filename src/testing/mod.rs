//! In-memory testing environment and test utilities.
//!
//! [`CompositionBuilder`] provides a convenient way to create test Set
//! compositions, served by [`StaticComposition`].
//!
//! [`StaticDexQuotes`], [`StaticPrices`] and [`StaticGasPrice`] stand in for
//! the 0x, CoinGecko and gas station services, so a [`crate::quote::TradeQuoter`]
//! can be exercised without any network access.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::primitives::{Address, Bytes, U256, address};
use fastnum::UD256;

use crate::{
    Chain,
    coingecko::{CoinPrices, TokenPricing, fill_missing_prices},
    composition::{ComponentPosition, SetComposition, SetCompositionReader},
    error::ProviderError,
    gas_oracle::{GasOracleError, GasPriceEstimating, GasSpeed},
    num::PRECISE_UNIT,
    quote::TradeQuoter,
    types::{TokenMap, TokenMetadata},
    zeroex::{DexQuote, DexQuoteQuery, DexQuoting, ZeroExError},
};

pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
pub const SET: Address = address!("0x1494CA1F11D487c2bBe4543E90080AeBa4BA3C2b");
pub const MANAGER: Address = address!("0x0dEa6d942a2D8f594844F973366859616Dd5ea50");

pub fn usdc() -> TokenMetadata {
    TokenMetadata::new(USDC, "USDC", "USD Coin", 6)
}

pub fn weth() -> TokenMetadata {
    TokenMetadata::new(WETH, "WETH", "Wrapped Ether", 18)
}

pub fn dai() -> TokenMetadata {
    TokenMetadata::new(DAI, "DAI", "Dai Stablecoin", 18)
}

pub fn token_map(tokens: impl IntoIterator<Item = TokenMetadata>) -> Arc<TokenMap> {
    Arc::new(tokens.into_iter().map(|t| (t.address, t)).collect())
}

/// `amount * 10^decimals`
pub fn scale(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10).pow(U256::from(decimals))
}

/// Whole Set tokens in base units.
pub fn sets(amount: u64) -> U256 {
    U256::from(amount) * PRECISE_UNIT
}

/// Builder for creating test Set compositions.
///
/// # Example
///
/// ```
/// use set_sdk::testing::{CompositionBuilder, USDC, WETH, scale, sets};
///
/// let composition = CompositionBuilder::new()
///     .total_supply(sets(10))
///     .position(USDC, scale(50, 6))
///     .position(WETH, scale(1, 16))
///     .build();
/// assert_eq!(composition.unit_of(USDC), Some(scale(50, 6)));
/// ```
#[derive(Clone, Debug)]
pub struct CompositionBuilder {
    manager: Address,
    total_supply: U256,
    positions: Vec<ComponentPosition>,
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionBuilder {
    /// Create a new builder of a single Set token managed by [`MANAGER`] with no positions.
    pub fn new() -> Self {
        Self {
            manager: MANAGER,
            total_supply: sets(1),
            positions: Vec::new(),
        }
    }

    pub fn manager(mut self, manager: Address) -> Self {
        self.manager = manager;
        self
    }

    /// Set the total supply, in Set base units.
    pub fn total_supply(mut self, total_supply: U256) -> Self {
        self.total_supply = total_supply;
        self
    }

    /// Add a default position of `unit` base units per Set.
    pub fn position(mut self, component: Address, unit: U256) -> Self {
        self.positions.push(ComponentPosition { component, unit });
        self
    }

    pub fn build(self) -> SetComposition {
        SetComposition {
            manager: self.manager,
            total_supply: self.total_supply,
            positions: self.positions,
        }
    }
}

/// Serves the same composition for every Set.
#[derive(Debug)]
pub struct StaticComposition {
    composition: Option<SetComposition>,
}

impl StaticComposition {
    pub fn new(composition: SetComposition) -> Self {
        Self {
            composition: Some(composition),
        }
    }

    /// Fails every read as if the call reverted.
    pub fn reverting() -> Self {
        Self { composition: None }
    }
}

#[async_trait::async_trait]
impl SetCompositionReader for StaticComposition {
    async fn fetch_composition(
        &self,
        _set: Address,
        components: &[Address],
    ) -> Result<SetComposition, ProviderError> {
        let mut composition = self
            .composition
            .clone()
            .ok_or(ProviderError::Reverted("execution reverted".to_string()))?;
        composition
            .positions
            .retain(|p| components.is_empty() || components.contains(&p.component));
        Ok(composition)
    }
}

type Responder = Box<dyn Fn(&DexQuoteQuery) -> Result<DexQuote, ZeroExError> + Send + Sync>;

/// Swap quotes computed from the query, recording every query received.
#[derive(derive_more::Debug)]
pub struct StaticDexQuotes {
    #[debug(skip)]
    responder: Responder,
    queries: Mutex<Vec<DexQuoteQuery>>,
}

impl StaticDexQuotes {
    /// Fills the whole sell amount at `buy_amount / sell_amount = numerator / denominator`,
    /// with `gas` as the swap estimate.
    pub fn at_rate(numerator: U256, denominator: U256, gas: u64) -> Self {
        Self::with_responder(move |query| {
            let buy_amount = query.sell_amount * numerator / denominator;
            Ok(DexQuote {
                guaranteed_price: UD256::ZERO,
                price: UD256::ZERO,
                sell_amount: query.sell_amount,
                buy_amount,
                calldata: Bytes::from_static(&[0xd9, 0x62, 0x7a, 0xa4]),
                gas,
            })
        })
    }

    /// Fills any query with a fixed buy amount.
    pub fn fixed(buy_amount: U256, gas: u64) -> Self {
        Self::with_responder(move |query| {
            Ok(DexQuote {
                guaranteed_price: UD256::ZERO,
                price: UD256::ZERO,
                sell_amount: query.sell_amount,
                buy_amount,
                calldata: Bytes::new(),
                gas,
            })
        })
    }

    /// Fails every query with a 0x API error.
    pub fn failing(message: &'static str) -> Self {
        Self::with_responder(move |_| Err(ZeroExError::Api(message.to_string())))
    }

    pub fn with_responder(
        responder: impl Fn(&DexQuoteQuery) -> Result<DexQuote, ZeroExError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<DexQuoteQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DexQuoting for StaticDexQuotes {
    async fn quote(&self, query: &DexQuoteQuery) -> Result<DexQuote, ZeroExError> {
        self.queries.lock().unwrap().push(query.clone());
        (self.responder)(query)
    }
}

/// USD prices by token, unknown tokens are reported at zero.
#[derive(Clone, Debug, Default)]
pub struct StaticPrices {
    prices: HashMap<Address, f64>,
}

impl StaticPrices {
    pub fn new(prices: impl IntoIterator<Item = (Address, f64)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl TokenPricing for StaticPrices {
    async fn fetch_coin_prices(&self, addresses: &[Address], currencies: &[&str]) -> CoinPrices {
        let currency = currencies.first().copied().unwrap_or("usd");
        let prices = addresses
            .iter()
            .filter_map(|a| self.prices.get(a).map(|p| (*a, p)))
            .map(|(a, p)| (a, HashMap::from([(currency.to_string(), *p)])))
            .collect();
        fill_missing_prices(prices, addresses, currencies)
    }
}

/// Reports the same gas price, in gwei, for every speed.
#[derive(Clone, Copy, Debug)]
pub struct StaticGasPrice {
    gwei: Option<UD256>,
}

impl StaticGasPrice {
    pub fn new(gwei: UD256) -> Self {
        Self { gwei: Some(gwei) }
    }

    /// Fails every fetch as if the gas station returned malformed JSON.
    pub fn failing() -> Self {
        Self { gwei: None }
    }
}

#[async_trait::async_trait]
impl GasPriceEstimating for StaticGasPrice {
    async fn fetch_gas_price(&self, _speed: GasSpeed) -> Result<UD256, GasOracleError> {
        self.gwei.ok_or_else(|| {
            let body = "<html>".to_string();
            let err = serde_json::from_str::<serde_json::Value>(&body)
                .expect_err("not a JSON document");
            GasOracleError::Deserialize(err, body)
        })
    }
}

/// Quoter on Ethereum mainnet backed by in-memory collaborators.
pub fn quoter(
    composition: StaticComposition,
    dex: Arc<StaticDexQuotes>,
    prices: StaticPrices,
    gas: StaticGasPrice,
) -> TradeQuoter {
    TradeQuoter::new(
        Chain::ethereum(),
        Arc::new(composition),
        dex,
        Arc::new(prices),
        Arc::new(gas),
    )
}
