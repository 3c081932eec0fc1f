//! Configuration for the trade quote tool.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details, keys
//! - CLI arguments: the trade to quote

use std::sync::Arc;

use alloy::primitives::U256;
use clap::Parser;
use fastnum::{UD64, decimal::Context};
use set_sdk::{
    gas_oracle::GasSpeed,
    quote::QuoterConfig,
    types::{QuoteRequest, TokenMap},
};

/// Environment configuration (connection details, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID (1 for Ethereum mainnet, 137 for Polygon)
    pub chain_id: u64,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Optional 0x API key, sent as `0x-api-key`
    pub zeroex_api_key: Option<String>,

    /// Optional timeout for the quote (default: 30s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

/// CLI arguments describing the trade.
#[derive(Debug, Parser)]
#[command(name = "trade-quote")]
#[command(about = "Quote a trade of one Set component into another")]
pub struct CliConfig {
    /// Set token address
    #[arg(long)]
    pub set: String,

    /// Component sold by the Set
    #[arg(long)]
    pub from_token: String,

    /// Component bought by the Set
    #[arg(long)]
    pub to_token: String,

    /// Amount of `from_token` to sell, in whole tokens (e.g., 1.5)
    #[arg(long)]
    pub amount: String,

    /// Tolerance applied to the bought amount, in percent
    #[arg(long, default_value = "2")]
    pub slippage: String,

    /// Fee taken in the bought token, in percent
    #[arg(long)]
    pub fee: Option<String>,

    /// Request a firm quote
    #[arg(long, default_value_t = false)]
    pub firm: bool,

    /// Smallest position, in base units per Set, the trade may leave or create
    #[arg(long, default_value_t = 50)]
    pub dust_threshold: u64,

    /// Gas price tier: average, fast or fastest
    #[arg(long, default_value = "fast")]
    pub gas_speed: String,
}

impl CliConfig {
    /// Build the quote request for the given chain and token map.
    pub fn to_request(
        &self,
        chain_id: u64,
        token_map: Arc<TokenMap>,
    ) -> Result<QuoteRequest, ConfigError> {
        let slippage = parse_percentage(&self.slippage, "slippage")?;
        let mut request = QuoteRequest::new(
            &self.from_token,
            &self.to_token,
            &self.set,
            &self.amount,
            chain_id,
            token_map,
        )
        .with_slippage_percentage(slippage);

        if let Some(fee) = &self.fee {
            request = request.with_fee_percentage(parse_percentage(fee, "fee")?);
        }
        if self.firm {
            request = request.firm();
        }
        Ok(request)
    }

    /// Convert CLI config to the quoter tunables.
    pub fn to_quoter_config(&self) -> Result<QuoterConfig, ConfigError> {
        let gas_speed = match self.gas_speed.to_ascii_lowercase().as_str() {
            "average" => GasSpeed::Average,
            "fast" => GasSpeed::Fast,
            "fastest" => GasSpeed::Fastest,
            other => return Err(ConfigError::InvalidGasSpeed(other.to_string())),
        };

        Ok(QuoterConfig {
            dust_threshold: U256::from(self.dust_threshold),
            gas_speed,
            ..Default::default()
        })
    }
}

fn parse_percentage(raw: &str, name: &'static str) -> Result<UD64, ConfigError> {
    UD64::from_str(raw, Context::default()).map_err(|_| ConfigError::InvalidPercentage(name))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid percentage value for {0}")]
    InvalidPercentage(&'static str),

    #[error("Unknown gas speed {0:?}, expected average, fast or fastest")]
    InvalidGasSpeed(String),
}

#[cfg(test)]
mod tests {
    use fastnum::udec64;

    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            set: "0x1494CA1F11D487c2bBe4543E90080AeBa4BA3C2b".to_string(),
            from_token: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            to_token: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(),
            amount: "100".to_string(),
            slippage: "2".to_string(),
            fee: None,
            firm: false,
            dust_threshold: 50,
            gas_speed: "fast".to_string(),
        }
    }

    #[test]
    fn test_cli_config_to_request() {
        let request = cli().to_request(1, Arc::default()).unwrap();
        assert_eq!(request.raw_amount(), "100");
        assert_eq!(request.chain_id(), 1);
        assert_eq!(request.slippage_percentage(), udec64!(2));
        assert_eq!(request.fee_percentage(), None);
        assert!(!request.is_firm_quote());
    }

    #[test]
    fn test_firm_request_with_fee() {
        let cli = CliConfig {
            fee: Some("0.5".to_string()),
            firm: true,
            slippage: "0.25".to_string(),
            ..cli()
        };

        let request = cli.to_request(137, Arc::default()).unwrap();
        assert_eq!(request.fee_percentage(), Some(udec64!(0.5)));
        assert_eq!(request.slippage_percentage(), udec64!(0.25));
        assert!(request.is_firm_quote());
    }

    #[test]
    fn test_invalid_percentage() {
        let cli = CliConfig {
            slippage: "two".to_string(),
            ..cli()
        };

        assert!(matches!(
            cli.to_request(1, Arc::default()),
            Err(ConfigError::InvalidPercentage("slippage"))
        ));
    }

    #[test]
    fn test_cli_config_to_quoter_config() {
        let cli = CliConfig {
            dust_threshold: 10,
            gas_speed: "Fastest".to_string(),
            ..cli()
        };

        let config = cli.to_quoter_config().unwrap();
        assert_eq!(config.dust_threshold, U256::from(10));
        assert_eq!(config.gas_speed, GasSpeed::Fastest);
        assert_eq!(config.gas_overhead, 150_000);
    }

    #[test]
    fn test_invalid_gas_speed() {
        let cli = CliConfig {
            gas_speed: "slow".to_string(),
            ..cli()
        };

        assert!(matches!(
            cli.to_quoter_config(),
            Err(ConfigError::InvalidGasSpeed(speed)) if speed == "slow"
        ));
    }
}
