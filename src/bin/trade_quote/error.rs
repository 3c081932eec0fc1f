//! Error types for the trade quote tool.

use set_sdk::{coingecko::TokenListError, error::QuoteError};

use crate::config::ConfigError;

/// Main error type for the trade quote tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token list error: {0}")]
    TokenList(#[from] TokenListError),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Quote timeout after {0} seconds")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
