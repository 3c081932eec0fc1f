use std::collections::HashMap;

use alloy::primitives::Address;

/// Token metadata keyed by address.
pub type TokenMap = HashMap<Address, TokenMetadata>;

/// ERC-20 token metadata as published by a token list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub chain_id: Option<u64>,
    pub logo_uri: Option<String>,
}

impl TokenMetadata {
    pub fn new(address: Address, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            chain_id: None,
            logo_uri: None,
        }
    }
}
