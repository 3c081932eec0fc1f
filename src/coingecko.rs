//! CoinGecko token prices and token lists.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use itertools::Itertools;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::{
    Chain,
    error::InputError,
    types::{TokenMap, TokenMetadata},
};

/// Default CoinGecko API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.coingecko.com/api/v3";

/// Prices keyed by token address, then by currency code.
pub type CoinPrices = HashMap<Address, HashMap<String, f64>>;

/// Source of fiat token prices.
///
/// Implementations never fail: a price that can not be fetched is reported as zero.
#[async_trait::async_trait]
pub trait TokenPricing: Send + Sync {
    async fn fetch_coin_prices(&self, addresses: &[Address], currencies: &[&str]) -> CoinPrices;
}

#[derive(Debug, thiserror::Error)]
pub enum TokenListError {
    #[error("token list request failed: {0}")]
    Send(reqwest::Error),

    #[error("token list returned status {0}")]
    Status(StatusCode),

    #[error("failed to fetch token list body: {0}")]
    TextFetch(reqwest::Error),

    #[error("failed to parse token list: {0}")]
    Deserialize(serde_json::Error),
}

#[derive(Debug)]
struct TokenList {
    tokens: Arc<Vec<TokenMetadata>>,
    map: Arc<TokenMap>,
}

/// CoinGecko client, bound to the platform of a single chain.
///
/// The token list is fetched on first use and kept for the lifetime of the client.
#[derive(Debug)]
pub struct CoinGeckoClient {
    client: Client,
    endpoint: Url,
    platform: &'static str,
    token_list_url: Url,
    token_list: OnceCell<TokenList>,
}

impl CoinGeckoClient {
    /// Creates a client for the CoinGecko platform of `chain_id`.
    pub fn new(chain_id: u64, client: Client) -> Result<Self, InputError> {
        let chain = Chain::from_id(chain_id)?;
        Ok(Self {
            client,
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid CoinGecko URL"),
            platform: chain.coingecko_platform(),
            token_list_url: Url::parse(chain.token_list_url()).expect("valid token list URL"),
            token_list: OnceCell::new(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_token_list_url(mut self, token_list_url: Url) -> Self {
        self.token_list_url = token_list_url;
        self
    }

    pub fn platform(&self) -> &'static str {
        self.platform
    }

    /// Token list of the chain's platform.
    pub async fn fetch_token_list(&self) -> Result<Arc<Vec<TokenMetadata>>, TokenListError> {
        Ok(self.token_list().await?.tokens.clone())
    }

    /// Token list of the chain's platform keyed by address.
    pub async fn fetch_token_map(&self) -> Result<Arc<TokenMap>, TokenListError> {
        Ok(self.token_list().await?.map.clone())
    }

    /// Price of a single token in a single currency, zero if unavailable.
    pub async fn fetch_token_price(&self, address: Address, currency: &str) -> f64 {
        self.fetch_coin_prices(&[address], &[currency])
            .await
            .get(&address)
            .and_then(|prices| prices.get(currency))
            .copied()
            .unwrap_or_default()
    }

    /// Price query URL, `None` if the endpoint can not carry a path.
    fn token_price_url(&self, addresses: &[Address], currencies: &[&str]) -> Option<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["simple", "token_price", self.platform]);
        url.query_pairs_mut()
            .append_pair(
                "contract_addresses",
                &addresses.iter().map(|a| format!("{a:#x}")).join(","),
            )
            .append_pair("vs_currencies", &currencies.iter().join(","));
        Some(url)
    }

    async fn try_fetch_coin_prices(
        &self,
        addresses: &[Address],
        currencies: &[&str],
    ) -> Result<CoinPrices, String> {
        let url = self
            .token_price_url(addresses, currencies)
            .ok_or_else(|| format!("invalid CoinGecko endpoint {}", self.endpoint))?;
        tracing::debug!("Querying CoinGecko API: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| format!("failed to send CoinGecko price request: {err}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "CoinGecko returned non-success status code: {}",
                response.status()
            ));
        }
        let text = response
            .text()
            .await
            .map_err(|err| format!("failed to fetch response body: {err}"))?;
        tracing::debug!("Response from CoinGecko API: {}", text);

        let parsed = serde_json::from_str::<HashMap<String, HashMap<String, f64>>>(&text)
            .map_err(|err| format!("failed to parse response {text:?}: {err}"))?;
        Ok(parsed
            .into_iter()
            .filter_map(|(address, prices)| Some((address.parse::<Address>().ok()?, prices)))
            .collect())
    }

    async fn token_list(&self) -> Result<&TokenList, TokenListError> {
        self.token_list
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.token_list_url, "Fetching token list");
                let response = self
                    .client
                    .get(self.token_list_url.clone())
                    .send()
                    .await
                    .map_err(TokenListError::Send)?;
                if !response.status().is_success() {
                    return Err(TokenListError::Status(response.status()));
                }
                let text = response.text().await.map_err(TokenListError::TextFetch)?;
                let tokens = parse_token_list(&text)?;
                tracing::info!(tokens = tokens.len(), platform = self.platform, "Token list loaded");
                let map = tokens.iter().map(|t| (t.address, t.clone())).collect();
                Ok(TokenList {
                    tokens: Arc::new(tokens),
                    map: Arc::new(map),
                })
            })
            .await
    }
}

#[async_trait::async_trait]
impl TokenPricing for CoinGeckoClient {
    async fn fetch_coin_prices(&self, addresses: &[Address], currencies: &[&str]) -> CoinPrices {
        let prices = match self.try_fetch_coin_prices(addresses, currencies).await {
            Ok(prices) => prices,
            Err(err) => {
                tracing::warn!(%err, "CoinGecko price fetch failed, reporting zero prices");
                CoinPrices::new()
            }
        };
        fill_missing_prices(prices, addresses, currencies)
    }
}

/// Reports a zero price in the first currency for every address the service had no price for.
pub fn fill_missing_prices(
    mut prices: CoinPrices,
    addresses: &[Address],
    currencies: &[&str],
) -> CoinPrices {
    let currency = currencies.first().copied().unwrap_or("usd");
    for address in addresses {
        prices
            .entry(*address)
            .or_insert_with(|| HashMap::from([(currency.to_string(), 0.0)]));
    }
    prices
}

#[derive(Debug, Deserialize)]
struct RawTokenList {
    tokens: Vec<RawToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawToken {
    address: String,
    symbol: String,
    name: String,
    decimals: u8,
    chain_id: Option<u64>,
    #[serde(rename = "logoURI")]
    logo_uri: Option<String>,
}

fn parse_token_list(text: &str) -> Result<Vec<TokenMetadata>, TokenListError> {
    let list = serde_json::from_str::<RawTokenList>(text).map_err(TokenListError::Deserialize)?;
    Ok(list
        .tokens
        .into_iter()
        .filter_map(|t| {
            Some(TokenMetadata {
                address: t.address.parse().ok()?,
                symbol: t.symbol,
                name: t.name,
                decimals: t.decimals,
                chain_id: t.chain_id,
                logo_uri: t.logo_uri,
            })
        })
        .collect())
}
