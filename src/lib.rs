//! Set Protocol V2 SDK.
//!
//! # Overview
//!
//! Trade quotes for rebalancing the components of deployed Set tokens.
//!
//! Use [`quote::TradeQuoter`] to turn a [`types::QuoteRequest`] into a
//! [`types::TradeQuote`]: the amount is bounded by the Set's on-chain
//! position, quoted by the 0x aggregator, converted into per-Set units with
//! the same rounding the trade module applies on-chain, and priced in USD.
//!
//! The quoter reads the chain through [`composition::OnChainSetReader`] and
//! talks to three HTTP services: [`zeroex::ZeroExClient`],
//! [`coingecko::CoinGeckoClient`] and [`gas_oracle::GasOracle`]. Each of them
//! sits behind a trait so any of them can be swapped, see [`testing`].
//!
//! # Limitations/follow-ups
//!
//! * Only Ethereum mainnet and Polygon are supported.
//!
//! * Quotes are routed through 0x only.
//!
//! # Testing
//!
//! [`testing`] module provides in-memory implementations of all external
//! collaborators of the quoter.

pub mod abi;
pub mod coingecko;
pub mod composition;
pub mod error;
pub mod gas_oracle;
pub mod num;
pub mod quote;
pub mod testing;
pub mod types;
pub mod zeroex;

use alloy::primitives::{Address, address};

use crate::{error::InputError, gas_oracle::GasStation};

#[derive(Clone, Debug)]
/// Network the deployed Set Protocol contracts operate on.
pub struct Chain {
    chain_id: u64,
    chain_currency: Address,
    currency_symbol: &'static str,
    coingecko_platform: &'static str,
    token_list_url: &'static str,
    zeroex_url: &'static str,
    gas_station: GasStation,
}

impl Chain {
    pub const ETHEREUM_ID: u64 = 1;
    pub const POLYGON_ID: u64 = 137;

    pub fn ethereum() -> Self {
        Self {
            chain_id: Self::ETHEREUM_ID,
            chain_currency: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            currency_symbol: "ETH",
            coingecko_platform: "ethereum",
            token_list_url: "https://tokens.coingecko.com/uniswap/all.json",
            zeroex_url: "https://api.0x.org",
            gas_station: GasStation::EthGasStation,
        }
    }

    pub fn polygon() -> Self {
        Self {
            chain_id: Self::POLYGON_ID,
            chain_currency: address!("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
            currency_symbol: "MATIC",
            coingecko_platform: "polygon-pos",
            token_list_url: "https://unpkg.com/quickswap-default-token-list@1.0.71/build/quickswap-default.tokenlist.json",
            zeroex_url: "https://polygon.api.0x.org",
            gas_station: GasStation::Polygon,
        }
    }

    /// Resolves a supported network by its chain ID.
    pub fn from_id(chain_id: u64) -> Result<Self, InputError> {
        match chain_id {
            Self::ETHEREUM_ID => Ok(Self::ethereum()),
            Self::POLYGON_ID => Ok(Self::polygon()),
            id => Err(InputError::UnsupportedChain(id)),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Wrapped native currency token, used to price gas.
    pub fn chain_currency(&self) -> Address {
        self.chain_currency
    }

    pub fn currency_symbol(&self) -> &'static str {
        self.currency_symbol
    }

    pub fn coingecko_platform(&self) -> &'static str {
        self.coingecko_platform
    }

    pub fn token_list_url(&self) -> &'static str {
        self.token_list_url
    }

    pub fn zeroex_url(&self) -> &'static str {
        self.zeroex_url
    }

    pub fn gas_station(&self) -> GasStation {
        self.gas_station
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_from_id() {
        assert_eq!(Chain::from_id(1).unwrap().currency_symbol(), "ETH");
        assert_eq!(Chain::from_id(137).unwrap().coingecko_platform(), "polygon-pos");
        assert!(matches!(
            Chain::from_id(10),
            Err(InputError::UnsupportedChain(10))
        ));
    }
}
