//! Gas price estimates from chain-specific gas station services.

use fastnum::{UD256, udec256};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{Chain, error::InputError, num};

/// Speed tier of a gas price estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GasSpeed {
    Average,
    #[default]
    Fast,
    Fastest,
}

/// Gas station service a chain is served by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasStation {
    /// ETH Gas Station, reports prices in tenths of gwei.
    EthGasStation,
    /// Polygon gas station, reports prices in gwei.
    Polygon,
}

impl GasStation {
    pub fn default_url(&self) -> &'static str {
        match self {
            GasStation::EthGasStation => "https://ethgasstation.info/json/ethgasAPI.json",
            GasStation::Polygon => "https://gasstation-mainnet.matic.network",
        }
    }

    /// Extracts the price for the given tier in gwei from the raw response body.
    pub fn parse_gwei(&self, body: &str, speed: GasSpeed) -> Result<UD256, GasOracleError> {
        let parse_err = |err| GasOracleError::Deserialize(err, body.to_string());
        match self {
            GasStation::EthGasStation => {
                let prices = serde_json::from_str::<EthGasStationPrices>(body).map_err(parse_err)?;
                let tenths = match speed {
                    GasSpeed::Average => prices.average,
                    GasSpeed::Fast => prices.fast,
                    GasSpeed::Fastest => prices.fastest,
                };
                Ok(num::decimal_from_f64(tenths) / udec256!(10))
            }
            GasStation::Polygon => {
                let prices = serde_json::from_str::<PolygonGasPrices>(body).map_err(parse_err)?;
                let gwei = match speed {
                    GasSpeed::Average => prices.standard,
                    GasSpeed::Fast => prices.fast,
                    GasSpeed::Fastest => prices.fastest,
                };
                Ok(num::decimal_from_f64(gwei))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EthGasStationPrices {
    average: f64,
    fast: f64,
    fastest: f64,
}

#[derive(Debug, Deserialize)]
struct PolygonGasPrices {
    standard: f64,
    fast: f64,
    fastest: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GasOracleError {
    #[error("gas station request failed: {0}")]
    Send(reqwest::Error),

    #[error("gas station returned status {0}")]
    Status(StatusCode),

    #[error("failed to fetch gas station response body: {0}")]
    TextFetch(reqwest::Error),

    #[error("failed to parse gas station response {1:?}: {0}")]
    Deserialize(serde_json::Error, String),
}

/// Source of current gas prices.
#[async_trait::async_trait]
pub trait GasPriceEstimating: Send + Sync {
    /// Current gas price in gwei for the given speed tier.
    async fn fetch_gas_price(&self, speed: GasSpeed) -> Result<UD256, GasOracleError>;
}

/// Gas station HTTP client, bound to a single chain.
#[derive(Debug)]
pub struct GasOracle {
    client: Client,
    url: Url,
    station: GasStation,
}

impl GasOracle {
    /// Creates a client for the gas station serving `chain_id`.
    pub fn new(chain_id: u64, client: Client) -> Result<Self, InputError> {
        let station = Chain::from_id(chain_id)?.gas_station();
        let url = Url::parse(station.default_url()).expect("valid gas station URL");
        Ok(Self {
            client,
            url,
            station,
        })
    }

    /// Overrides the gas station URL, the response format stays chain-specific.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn station(&self) -> GasStation {
        self.station
    }
}

#[async_trait::async_trait]
impl GasPriceEstimating for GasOracle {
    async fn fetch_gas_price(&self, speed: GasSpeed) -> Result<UD256, GasOracleError> {
        tracing::debug!(url = %self.url, ?speed, "Querying gas station");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(GasOracleError::Send)?;
        if !response.status().is_success() {
            return Err(GasOracleError::Status(response.status()));
        }
        let body = response.text().await.map_err(GasOracleError::TextFetch)?;
        tracing::debug!(%body, "Response from gas station");
        self.station.parse_gwei(&body, speed)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    #[test]
    fn test_unsupported_chain_rejected() {
        assert!(matches!(
            GasOracle::new(56, Client::new()),
            Err(InputError::UnsupportedChain(56))
        ));
        assert_eq!(
            GasOracle::new(137, Client::new()).unwrap().station(),
            GasStation::Polygon
        );
    }

    #[test]
    fn test_eth_gas_station_reports_tenths_of_gwei() {
        let body = r#"{"fast":450.0,"fastest":610.0,"safeLow":300.0,"average":366.0,"block_time":13.5,"blockNum":12345678,"speed":0.99,"safeLowWait":14.3,"avgWait":3.2,"fastWait":0.5,"fastestWait":0.4}"#;
        let station = GasStation::EthGasStation;
        assert_eq!(station.parse_gwei(body, GasSpeed::Fast).unwrap(), udec256!(45));
        assert_eq!(station.parse_gwei(body, GasSpeed::Fastest).unwrap(), udec256!(61));
        assert_eq!(station.parse_gwei(body, GasSpeed::Average).unwrap(), udec256!(36.6));
    }

    #[test]
    fn test_polygon_gas_station_reports_gwei() {
        let body = r#"{"safeLow":30,"standard":35.5,"fast":40,"fastest":52.25,"blockTime":2,"blockNumber":16016532}"#;
        let station = GasStation::Polygon;
        assert_eq!(station.parse_gwei(body, GasSpeed::Average).unwrap(), udec256!(35.5));
        assert_eq!(station.parse_gwei(body, GasSpeed::Fast).unwrap(), udec256!(40));
        assert_eq!(station.parse_gwei(body, GasSpeed::Fastest).unwrap(), udec256!(52.25));
    }

    #[test]
    fn test_malformed_response() {
        let err = GasStation::Polygon
            .parse_gwei(r#"{"message":"rate limited"}"#, GasSpeed::Fast)
            .unwrap_err();
        assert!(matches!(err, GasOracleError::Deserialize(_, body) if body.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_fetch_gas_price_from_eth_gas_station() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/json/ethgasAPI.json");
                then.status(200).json_body(serde_json::json!({
                    "fast": 450.0,
                    "fastest": 610.0,
                    "safeLow": 300.0,
                    "average": 366.0,
                }));
            })
            .await;
        let oracle = GasOracle::new(1, Client::new())
            .unwrap()
            .with_url(Url::parse(&server.url("/json/ethgasAPI.json")).unwrap());

        assert_eq!(oracle.fetch_gas_price(GasSpeed::Fast).await.unwrap(), udec256!(45));
        assert_eq!(oracle.fetch_gas_price(GasSpeed::Average).await.unwrap(), udec256!(36.6));
        assert_eq!(mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_fetch_gas_price_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(502).body("bad gateway");
            })
            .await;
        let oracle = GasOracle::new(137, Client::new())
            .unwrap()
            .with_url(Url::parse(&server.url("/")).unwrap());

        assert!(matches!(
            oracle.fetch_gas_price(GasSpeed::Fast).await,
            Err(GasOracleError::Status(StatusCode::BAD_GATEWAY))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_polygon_gas_station_e2e() {
        let oracle = GasOracle::new(137, Client::new()).unwrap();
        let price = oracle.fetch_gas_price(GasSpeed::Fast).await;
        dbg!(&price);
        assert!(price.is_ok());
    }
}
