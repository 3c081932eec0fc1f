use std::sync::Arc;

use fastnum::{UD64, udec64};

use super::TokenMap;

/// Default tolerance applied to the bought amount, in percent.
pub const DEFAULT_SLIPPAGE_PERCENTAGE: UD64 = udec64!(2);

/// Request to quote a trade of one Set component into another.
///
/// Addresses are taken as caller strings in any hex case and normalized
/// by [`crate::quote::TradeQuoter::generate`]. `raw_amount` is a human
/// readable decimal amount of `from_token` (`"1.5"`), converted with the
/// decimals found in `token_map`.
#[derive(Clone, derive_more::Debug)]
pub struct QuoteRequest {
    from_token: String,
    to_token: String,
    from_address: String,
    raw_amount: String,
    chain_id: u64,
    #[debug(skip)]
    token_map: Arc<TokenMap>,
    #[debug("{fee_percentage:?}")]
    fee_percentage: Option<UD64>,
    is_firm_quote: bool,
    #[debug("{slippage_percentage}")]
    slippage_percentage: UD64,
}

impl QuoteRequest {
    /// Create a new indicative quote request with default slippage and no fee.
    pub fn new(
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        from_address: impl Into<String>,
        raw_amount: impl Into<String>,
        chain_id: u64,
        token_map: Arc<TokenMap>,
    ) -> Self {
        Self {
            from_token: from_token.into(),
            to_token: to_token.into(),
            from_address: from_address.into(),
            raw_amount: raw_amount.into(),
            chain_id,
            token_map,
            fee_percentage: None,
            is_firm_quote: false,
            slippage_percentage: DEFAULT_SLIPPAGE_PERCENTAGE,
        }
    }

    /// Sets the fee taken in the bought token, in percent.
    pub fn with_fee_percentage(mut self, fee_percentage: UD64) -> Self {
        self.fee_percentage = Some(fee_percentage);
        self
    }

    /// Sets the tolerance applied to the bought amount, in percent (default: 2).
    pub fn with_slippage_percentage(mut self, slippage_percentage: UD64) -> Self {
        self.slippage_percentage = slippage_percentage;
        self
    }

    /// Requests a firm quote, signalling the intent to fill it.
    pub fn firm(mut self) -> Self {
        self.is_firm_quote = true;
        self
    }

    pub fn from_token(&self) -> &str {
        &self.from_token
    }

    pub fn to_token(&self) -> &str {
        &self.to_token
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn raw_amount(&self) -> &str {
        &self.raw_amount
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn token_map(&self) -> &TokenMap {
        &self.token_map
    }

    pub fn fee_percentage(&self) -> Option<UD64> {
        self.fee_percentage
    }

    pub fn is_firm_quote(&self) -> bool {
        self.is_firm_quote
    }

    pub fn slippage_percentage(&self) -> UD64 {
        self.slippage_percentage
    }
}
