//! 0x swap API client.
//!
//! For more information on the HTTP API, consult:
//! <https://0x.org/docs/0x-swap-api/api-references/get-swap-v1-quote>

use alloy::primitives::{Address, Bytes, U256, address};
use fastnum::{UD64, UD256, decimal::Context};
use itertools::Itertools;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{Chain, error::InputError, num};

/// Liquidity sources never routed through.
pub const EXCLUDED_SOURCES: [&str; 4] = ["Kyber", "Eth2Dai", "Uniswap", "Mesh"];

/// Receives the buy token fee and is credited as the integrator.
pub const FEE_RECIPIENT: Address = address!("0xD3D555Bb655AcBA9452bfC6D7cEa8cC7b3628C55");
pub const AFFILIATE_ADDRESS: Address = FEE_RECIPIENT;

/// Slippage tolerance passed to the aggregator, in basis points.
pub const DEFAULT_SLIPPAGE_BPS: u64 = 200;

/// Parameters of a single `/swap/v1/quote` request.
#[derive(Clone, derive_more::Debug)]
pub struct DexQuoteQuery {
    pub sell_token: Address,
    pub buy_token: Address,
    /// Amount of `sell_token` to sell, in base units.
    pub sell_amount: U256,
    /// Address that executes the swap, the Set manager for trade module calls.
    pub taker_address: Address,
    /// Firm quotes signal the intent to fill, indicative ones do not.
    pub is_firm: bool,
    /// Fee taken in `buy_token`, in percent.
    #[debug("{fee_percentage:?}")]
    pub fee_percentage: Option<UD64>,
}

/// Quote returned by the aggregator.
#[derive(Clone, PartialEq, derive_more::Debug)]
pub struct DexQuote {
    #[debug("{guaranteed_price}")]
    pub guaranteed_price: UD256,
    #[debug("{price}")]
    pub price: UD256,
    pub sell_amount: U256,
    pub buy_amount: U256,
    pub calldata: Bytes,
    /// Gas estimate of the swap alone.
    pub gas: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ZeroExError {
    #[error("0x API error: {0}")]
    Api(String),

    #[error("0x API returned status {0}: {1}")]
    Status(StatusCode, String),

    #[error("failed to parse 0x response {1:?}: {0}")]
    Deserialize(serde_json::Error, String),

    #[error("invalid {0} in 0x response: {1:?}")]
    InvalidField(&'static str, String),

    // Recovered response but failed on async call of response.text()
    #[error(transparent)]
    TextFetch(reqwest::Error),

    // Connectivity or non-response error
    #[error("failed on send: {0}")]
    Send(reqwest::Error),
}

/// Source of swap quotes.
#[async_trait::async_trait]
pub trait DexQuoting: Send + Sync {
    async fn quote(&self, query: &DexQuoteQuery) -> Result<DexQuote, ZeroExError>;
}

/// 0x API client, bound to a single chain.
#[derive(derive_more::Debug)]
pub struct ZeroExClient {
    client: Client,
    base_url: Url,
    #[debug(skip)]
    api_key: Option<String>,
    slippage_bps: u64,
}

impl ZeroExClient {
    /// Creates a client for the 0x deployment serving `chain_id`.
    pub fn new(chain_id: u64, api_key: Option<String>, client: Client) -> Result<Self, InputError> {
        let chain = Chain::from_id(chain_id)?;
        Ok(Self {
            client,
            base_url: Url::parse(chain.zeroex_url()).expect("valid 0x URL"),
            api_key,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Encodes the quote query as a url with get parameters.
    pub fn format_url(&self, query: &DexQuoteQuery) -> Url {
        let mut url = self
            .base_url
            .join("/swap/v1/quote")
            .expect("unexpectedly invalid URL segment");
        let fee = query
            .fee_percentage
            .map(|fee| num::Converter::new(6).to_unsigned(fee))
            .unwrap_or_default();
        url.query_pairs_mut()
            .append_pair("sellToken", &format!("{:#x}", query.sell_token))
            .append_pair("buyToken", &format!("{:#x}", query.buy_token))
            .append_pair(
                "slippagePercentage",
                &num::format_fixed(U256::from(self.slippage_bps), 4),
            )
            .append_pair("sellAmount", &query.sell_amount.to_string())
            .append_pair("takerAddress", &format!("{:#x}", query.taker_address))
            .append_pair("excludedSources", &EXCLUDED_SOURCES.iter().join(","))
            // Trade module calls are simulated on-chain, not by 0x.
            .append_pair("skipValidation", "true")
            .append_pair("feeRecipient", &format!("{FEE_RECIPIENT:#x}"))
            // Percent scaled by 1e6, rendered as a fraction.
            .append_pair("buyTokenPercentageFee", &num::format_fixed(fee, 8))
            .append_pair("affiliateAddress", &format!("{AFFILIATE_ADDRESS:#x}"))
            .append_pair("intentOnFilling", if query.is_firm { "true" } else { "false" });
        url
    }
}

#[async_trait::async_trait]
impl DexQuoting for ZeroExClient {
    async fn quote(&self, query: &DexQuoteQuery) -> Result<DexQuote, ZeroExError> {
        let url = self.format_url(query);
        tracing::debug!("Querying 0x API: {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("0x-api-key", key);
        }
        let response = request.send().await.map_err(ZeroExError::Send)?;
        let status = response.status();
        let text = response.text().await.map_err(ZeroExError::TextFetch)?;
        tracing::debug!("Response from 0x API: {}", text);

        parse_response(status, &text)
    }
}

/// Numeric field reported either as a JSON string or a JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Str(String),
    Num(serde_json::Number),
}

impl Numeric {
    fn into_string(self) -> String {
        match self {
            Numeric::Str(s) => s,
            Numeric::Num(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuote {
    guaranteed_price: Numeric,
    price: Numeric,
    sell_amount: Numeric,
    buy_amount: Numeric,
    data: String,
    gas: Numeric,
}

#[derive(Debug, Deserialize)]
struct ValidationError {
    field: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse<Ok> {
    ResponseOk(Ok),
    ResponseErr {
        reason: String,
        #[serde(default, rename = "validationErrors")]
        validation_errors: Vec<ValidationError>,
    },
}

fn parse_response(status: StatusCode, text: &str) -> Result<DexQuote, ZeroExError> {
    match serde_json::from_str::<RawResponse<RawQuote>>(text) {
        Ok(RawResponse::ResponseErr {
            reason,
            validation_errors,
        }) => Err(ZeroExError::Api(if validation_errors.is_empty() {
            reason
        } else {
            format!(
                "{reason} ({})",
                validation_errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.reason))
                    .join(", ")
            )
        })),
        _ if !status.is_success() => Err(ZeroExError::Status(status, text.to_string())),
        Ok(RawResponse::ResponseOk(raw)) => raw.try_into(),
        Err(err) => Err(ZeroExError::Deserialize(err, text.to_string())),
    }
}

impl TryFrom<RawQuote> for DexQuote {
    type Error = ZeroExError;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        let decimal = |field, value: Numeric| {
            let value = value.into_string();
            UD256::from_str(&value, Context::default())
                .map_err(|_| ZeroExError::InvalidField(field, value))
        };
        let integer = |field, value: Numeric| {
            let value = value.into_string();
            value
                .parse::<U256>()
                .map_err(|_| ZeroExError::InvalidField(field, value))
        };

        let gas = integer("gas", raw.gas)?;
        Ok(Self {
            guaranteed_price: decimal("guaranteedPrice", raw.guaranteed_price)?,
            price: decimal("price", raw.price)?,
            sell_amount: integer("sellAmount", raw.sell_amount)?,
            buy_amount: integer("buyAmount", raw.buy_amount)?,
            calldata: raw
                .data
                .parse::<Bytes>()
                .map_err(|_| ZeroExError::InvalidField("data", raw.data.clone()))?,
            gas: u64::try_from(gas)
                .map_err(|_| ZeroExError::InvalidField("gas", gas.to_string()))?,
        })
    }
}
