//! Trade quote tool for Set Protocol V2.
//!
//! This binary quotes a single trade of one Set component into another and
//! prints the quote.

mod config;
mod error;

use std::{process::exit, time::Duration};

use alloy::{
    providers::{DynProvider, ProviderBuilder},
    rpc::client::RpcClient,
};
use clap::Parser;
use set_sdk::{
    coingecko::CoinGeckoClient,
    quote::TradeQuoter,
    types::TradeQuote,
};
use tracing::{error, info};
use url::Url;

use config::{CliConfig, EnvConfig};
use error::{Error, Result};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    let quoter_config = match cli_config.to_quoter_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse RPC URL
    let node_url = match Url::parse(&env_config.node_rpc_url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Invalid RPC URL: {}", e);
            exit(1);
        }
    };

    let http = reqwest::Client::new();
    let rpc_client = RpcClient::new_http(node_url);
    let provider = DynProvider::new(ProviderBuilder::new().connect_client(rpc_client));

    let token_list = match CoinGeckoClient::new(env_config.chain_id, http.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Unsupported chain: {}", e);
            exit(1);
        }
    };

    let quoter = match TradeQuoter::from_provider(
        provider,
        env_config.chain_id,
        env_config.zeroex_api_key.clone(),
        http,
    ) {
        Ok(quoter) => quoter.with_config(quoter_config),
        Err(e) => {
            eprintln!("Failed to create trade quoter: {}", e);
            exit(1);
        }
    };

    // Default timeout is 30 seconds
    let timeout_seconds = env_config.timeout_seconds.unwrap_or(30);

    let quote = tokio::time::timeout(
        Duration::from_secs(timeout_seconds),
        request_quote(&quoter, &token_list, &cli_config, env_config.chain_id),
    )
    .await
    .unwrap_or(Err(Error::Timeout(timeout_seconds)));

    match quote {
        Ok(quote) => print_quote(&quote),
        Err(e) => {
            error!(%e, "Failed to generate trade quote");
            exit(1);
        }
    }
}

async fn request_quote(
    quoter: &TradeQuoter,
    token_list: &CoinGeckoClient,
    cli_config: &CliConfig,
    chain_id: u64,
) -> Result<TradeQuote> {
    let token_map = token_list.fetch_token_map().await?;
    let request = cli_config.to_request(chain_id, token_map)?;
    info!(?request, "Requesting trade quote");
    Ok(quoter.generate(&request).await?)
}

fn print_quote(quote: &TradeQuote) {
    let display = &quote.display;
    println!("Set:            {}", quote.from);
    println!(
        "Sell:           {} {} ({})",
        display.from_token_amount, display.from_token.symbol, display.from_token_price_usd
    );
    println!(
        "Buy:            {} {} ({})",
        display.to_token_amount, display.to_token.symbol, display.to_token_price_usd
    );
    println!("Units per Set:  -{} / +{}", quote.from_units, quote.to_units);
    println!("Slippage:       {} (tolerance {})", display.slippage, quote.slippage_percentage);
    println!("Fee:            {}", display.fee_percentage);
    println!(
        "Gas:            {} at {} gwei, {} ({})",
        quote.gas, quote.gas_price, display.gas_costs_chain_currency, display.gas_costs_usd
    );
    println!("Adapter:        {}", quote.exchange_adapter_name);
    println!("Calldata:       {:?}", quote.calldata);
}
