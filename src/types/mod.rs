mod quote;
mod request;
mod token;

pub use quote::{TradeQuote, TradeQuoteDisplay};
pub use request::QuoteRequest;
pub use token::{TokenMap, TokenMetadata};

/// Identifier of the Set Protocol exchange adapter the quote calldata targets.
pub const ZERO_EX_ADAPTER_NAME: &str = "ZeroExApiAdapterV3";
