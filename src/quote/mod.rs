//! Trade quote generation.
//!
//! [`TradeQuoter::generate`] validates the request, bounds the amount by
//! the Set's position, quotes the swap, converts the quoted amounts into
//! per-Set units and prices the result. Only the swap quote and the gas
//! price are required to succeed, missing token prices are reported as zero.

pub mod calc;
pub mod format;

use std::sync::Arc;

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
};
use fastnum::{UD64, UD256, udec64, udec256};

use crate::{
    Chain,
    coingecko::{CoinGeckoClient, CoinPrices, TokenPricing},
    composition::{OnChainSetReader, SetCompositionReader},
    error::{InputError, QuoteError},
    gas_oracle::{GasOracle, GasPriceEstimating, GasSpeed},
    num::Converter,
    types::{QuoteRequest, TradeQuote, TradeQuoteDisplay, ZERO_EX_ADAPTER_NAME},
    zeroex::{DexQuoteQuery, DexQuoting, ZeroExClient},
};

const USD: &str = "usd";

/// Tunables of the quote calculation.
#[derive(Clone, Copy, Debug)]
pub struct QuoterConfig {
    /// Positions below this many units per Set are rejected as dust.
    pub dust_threshold: U256,
    /// Gas added to the swap estimate for the trade module call.
    pub gas_overhead: u64,
    /// Buffer applied on top of the total gas, in percent.
    pub gas_buffer_percent: u64,
    pub gas_speed: GasSpeed,
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            dust_threshold: calc::DEFAULT_DUST_THRESHOLD,
            gas_overhead: calc::DEFAULT_GAS_OVERHEAD,
            gas_buffer_percent: calc::DEFAULT_GAS_BUFFER_PERCENT,
            gas_speed: GasSpeed::default(),
        }
    }
}

/// Quotes trades of Set components on a single chain.
///
/// Holds no per-request state, concurrent [`Self::generate`] calls are independent.
#[derive(Clone, derive_more::Debug)]
pub struct TradeQuoter {
    chain: Chain,
    #[debug(skip)]
    composition: Arc<dyn SetCompositionReader>,
    #[debug(skip)]
    dex: Arc<dyn DexQuoting>,
    #[debug(skip)]
    prices: Arc<dyn TokenPricing>,
    #[debug(skip)]
    gas: Arc<dyn GasPriceEstimating>,
    config: QuoterConfig,
}

impl TradeQuoter {
    pub fn new(
        chain: Chain,
        composition: Arc<dyn SetCompositionReader>,
        dex: Arc<dyn DexQuoting>,
        prices: Arc<dyn TokenPricing>,
        gas: Arc<dyn GasPriceEstimating>,
    ) -> Self {
        Self {
            chain,
            composition,
            dex,
            prices,
            gas,
            config: QuoterConfig::default(),
        }
    }

    /// Creates a quoter reading Set compositions through `provider` and
    /// quoting with the default service endpoints of `chain_id`.
    pub fn from_provider<P: Provider + Clone + 'static>(
        provider: P,
        chain_id: u64,
        zeroex_api_key: Option<String>,
        http: reqwest::Client,
    ) -> Result<Self, InputError> {
        let chain = Chain::from_id(chain_id)?;
        Ok(Self::new(
            chain,
            Arc::new(OnChainSetReader::new(provider)),
            Arc::new(ZeroExClient::new(chain_id, zeroex_api_key, http.clone())?),
            Arc::new(CoinGeckoClient::new(chain_id, http.clone())?),
            Arc::new(GasOracle::new(chain_id, http)?),
        ))
    }

    pub fn with_config(mut self, config: QuoterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &QuoterConfig {
        &self.config
    }

    /// Generates a trade quote of `request.from_token` into `request.to_token`
    /// for the Set at `request.from_address`.
    pub async fn generate(&self, request: &QuoteRequest) -> Result<TradeQuote, QuoteError> {
        if request.chain_id() != self.chain.chain_id() {
            return Err(InputError::ChainMismatch {
                requested: request.chain_id(),
                configured: self.chain.chain_id(),
            }
            .into());
        }

        let from_token = parse_address(request.from_token())?;
        let to_token = parse_address(request.to_token())?;
        let set = parse_address(request.from_address())?;

        let from_metadata = request
            .token_map()
            .get(&from_token)
            .cloned()
            .ok_or(InputError::UnknownToken(from_token))?;
        let to_metadata = request
            .token_map()
            .get(&to_token)
            .cloned()
            .ok_or(InputError::UnknownToken(to_token))?;

        let amount = Converter::new(from_metadata.decimals)
            .parse_units(request.raw_amount())
            .ok_or_else(|| {
                InputError::InvalidAmount(request.raw_amount().to_string(), from_metadata.decimals)
            })?;
        if amount.is_zero() {
            return Err(InputError::ZeroAmount.into());
        }
        if request
            .fee_percentage()
            .is_some_and(|fee| fee.is_nan() || fee > udec64!(100))
        {
            return Err(InputError::InvalidPercentage("fee").into());
        }
        let permille = calc::tolerance_permille(request.slippage_percentage())?;

        let composition = self
            .composition
            .fetch_composition(set, &[from_token, to_token])
            .await?;
        let total_supply = composition.total_supply;
        let current_from_unit = composition
            .unit_of(from_token)
            .ok_or(InputError::ComponentNotFound {
                set,
                component: from_token,
            })?;
        let current_to_unit = composition.unit_of(to_token).unwrap_or_default();

        let sell_amount = calc::bound_amount(amount, current_from_unit, total_supply)?;
        tracing::debug!(%set, %amount, %sell_amount, %total_supply, "Bounded trade amount");

        let dex_quote = self
            .dex
            .quote(&DexQuoteQuery {
                sell_token: from_token,
                buy_token: to_token,
                sell_amount,
                taker_address: composition.manager,
                is_firm: request.is_firm_quote(),
                fee_percentage: request.fee_percentage(),
            })
            .await?;

        let from_units =
            calc::from_units(dex_quote.sell_amount, total_supply).ok_or(QuoteError::Overflow)?;
        let to_units = calc::to_units(dex_quote.buy_amount, total_supply, permille)
            .ok_or(QuoteError::Overflow)?;
        calc::check_dust(
            current_from_unit,
            from_units,
            current_to_unit,
            to_units,
            self.config.dust_threshold,
        )?;
        let gas = calc::estimate_gas(
            dex_quote.gas,
            self.config.gas_overhead,
            self.config.gas_buffer_percent,
        )
        .ok_or(QuoteError::Overflow)?;

        let chain_currency = self.chain.chain_currency();
        let tokens = [chain_currency, from_token, to_token];
        let (prices, gas_price) = futures::join!(
            self.prices.fetch_coin_prices(&tokens, &[USD]),
            self.gas.fetch_gas_price(self.config.gas_speed),
        );
        let gas_price = gas_price?;

        let from_token_amount =
            Converter::new(from_metadata.decimals).from_unsigned::<4>(dex_quote.sell_amount);
        let to_token_amount =
            Converter::new(to_metadata.decimals).from_unsigned::<4>(dex_quote.buy_amount);
        let from_value = from_token_amount * usd_price(&prices, from_token);
        let to_value = to_token_amount * usd_price(&prices, to_token);
        let gas_costs = gas_price * UD256::from(gas) / udec256!(1000000000);
        let gas_costs_usd = gas_costs * usd_price(&prices, chain_currency);

        let quote = TradeQuote {
            from: set,
            from_token,
            to_token,
            exchange_adapter_name: ZERO_EX_ADAPTER_NAME,
            calldata: dex_quote.calldata,
            gas,
            gas_price,
            slippage_percentage: unsigned_percentage(request.slippage_percentage()),
            from_token_amount: dex_quote.sell_amount,
            to_token_amount: dex_quote.buy_amount,
            from_units,
            to_units,
            display: TradeQuoteDisplay {
                from_token_amount,
                to_token_amount,
                from_token_price_usd: format::usd(from_value),
                to_token_price_usd: format::usd(to_value),
                gas_costs_usd: format::usd(gas_costs_usd),
                gas_costs_chain_currency: format::chain_currency(
                    gas_costs,
                    self.chain.currency_symbol(),
                ),
                fee_percentage: unsigned_percentage(request.fee_percentage().unwrap_or(UD64::ZERO)),
                slippage: format::percentage(calc::realized_slippage(from_value, to_value)),
                from_token: from_metadata,
                to_token: to_metadata,
            },
        };
        tracing::info!(
            %set,
            from_token = %quote.display.from_token.symbol,
            to_token = %quote.display.to_token.symbol,
            from_units = %quote.from_units,
            to_units = %quote.to_units,
            gas = quote.gas,
            "Generated trade quote"
        );

        Ok(quote)
    }
}

fn parse_address(raw: &str) -> Result<Address, InputError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| InputError::InvalidAddress(raw.to_string()))
}

fn usd_price(prices: &CoinPrices, token: Address) -> UD256 {
    crate::num::decimal_from_f64(
        prices
            .get(&token)
            .and_then(|p| p.get(USD))
            .copied()
            .unwrap_or_default(),
    )
}

fn unsigned_percentage(value: UD64) -> String {
    let value: UD256 = value.resize();
    format::percentage(value.to_signed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_ignores_case() {
        let lower = parse_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let upper = parse_address("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48").unwrap();
        assert_eq!(lower, upper);
        assert!(matches!(
            parse_address("0x123"),
            Err(InputError::InvalidAddress(raw)) if raw == "0x123"
        ));
    }

    #[test]
    fn test_unsigned_percentage() {
        assert_eq!(unsigned_percentage(udec64!(2)), "2.00%");
        assert_eq!(unsigned_percentage(udec64!(0.25)), "0.25%");
    }
}
